use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub models: ModelPaths,
}

#[derive(Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        // Dev origin of the MealBridge frontend.
        Self {
            allowed_origin: "http://localhost:5173".to_string(),
        }
    }
}

/// Artifact locations for the served models. Every entry is optional:
/// a missing entry (or a path that fails to load) leaves the matching
/// endpoint answering `ModelUnavailable` instead of preventing startup.
#[derive(Deserialize, Clone, Default)]
pub struct ModelPaths {
    pub classifier: Option<ClassifierPaths>,
    pub donation_forecast: Option<PathBuf>,
    pub request_forecast: Option<PathBuf>,
    pub traffic: Option<TrafficPaths>,
}

#[derive(Deserialize, Clone)]
pub struct ClassifierPaths {
    /// ONNX graph of the image classifier.
    pub model: PathBuf,
    /// JSON array of class labels, index-aligned with the model output.
    pub labels: PathBuf,
}

#[derive(Deserialize, Clone)]
pub struct TrafficPaths {
    pub model: PathBuf,
    pub weather_encoder: PathBuf,
}
