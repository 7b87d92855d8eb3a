use crate::model::context::ModelContext;
use crate::server::{handlers, types::AppState};
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(
    models: ModelContext,
    cors: CorsLayer,
    metrics_handle: PrometheusHandle,
) -> Router {
    let state = Arc::new(AppState { models });

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/analyze", post(handlers::analyze))
        .route("/forecast/donations", get(handlers::forecast_donations))
        .route("/forecast/requests", get(handlers::forecast_requests))
        .route("/predict_duration", post(handlers::predict_duration))
        .route(
            "/metrics",
            get(move || async move { metrics_handle.render() }),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
