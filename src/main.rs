use axum::http::HeaderValue;
use mealbridge_ai::{config, model, server};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::fs;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Init
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let metrics_handle = PrometheusBuilder::new().install_recorder()?;

    // 2. Load Config
    let config_content = fs::read_to_string("config.yaml")?;
    let config: config::AppConfig = serde_yaml::from_str(&config_content)?;

    // 3. Initialize Models
    // The ONNX runtime only spins up when an image classifier is configured;
    // every model slot may fail to load without aborting startup.
    if config.models.classifier.is_some() {
        model::loader::init_ort()?;
    }
    let models = model::context::ModelContext::load(&config.models);

    // 4. Create Router
    let cors = CorsLayer::new()
        .allow_origin(config.cors.allowed_origin.parse::<HeaderValue>()?)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = server::routes::create_router(models, cors, metrics_handle);

    // 5. Bind & Serve
    let listener =
        TcpListener::bind(format!("{}:{}", config.server.host, config.server.port)).await?;
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "server listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
