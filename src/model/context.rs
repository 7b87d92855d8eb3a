use crate::config::{ClassifierPaths, ModelPaths, TrafficPaths};
use crate::error::ApiError;
use crate::model::encoder::WeatherEncoder;
use crate::model::forecast::ForecastModel;
use crate::model::loader;
use crate::model::regression::RegressionModel;
use ort::session::Session;
use std::sync::Mutex;

/// Every model handle the server owns, loaded once at startup and shared
/// read-only for the process lifetime. A slot left `None` (not configured,
/// or its artifact failed to load) keeps the matching endpoint answering
/// `ModelUnavailable` without taking the process down.
pub struct ModelContext {
    pub classifier: Option<ImageClassifier>,
    pub donation_forecast: Option<ForecastModel>,
    pub request_forecast: Option<ForecastModel>,
    pub duration: Option<DurationModels>,
}

pub struct ImageClassifier {
    /// `Session::run` takes `&mut self`, hence the lock.
    pub session: Mutex<Session>,
    /// Human-readable class labels, index-aligned with the model output.
    pub labels: Vec<String>,
}

/// The traffic regression model and its weather encoder ship (and fail)
/// together, the way the training pipeline exports them.
pub struct DurationModels {
    pub regression: RegressionModel,
    pub encoder: WeatherEncoder,
}

impl ModelContext {
    pub fn empty() -> Self {
        Self {
            classifier: None,
            donation_forecast: None,
            request_forecast: None,
            duration: None,
        }
    }

    /// Loads whatever the configuration points at. Failures are logged and
    /// leave the slot empty; startup continues either way.
    pub fn load(paths: &ModelPaths) -> Self {
        Self {
            classifier: paths
                .classifier
                .as_ref()
                .and_then(|p| try_load("image classifier", load_classifier(p))),
            donation_forecast: paths
                .donation_forecast
                .as_ref()
                .and_then(|p| try_load("donation forecast model", loader::load_artifact(p))),
            request_forecast: paths
                .request_forecast
                .as_ref()
                .and_then(|p| try_load("request forecast model", loader::load_artifact(p))),
            duration: paths
                .traffic
                .as_ref()
                .and_then(|p| try_load("traffic duration model", load_duration_models(p))),
        }
    }
}

fn try_load<T>(name: &str, result: Result<T, ApiError>) -> Option<T> {
    match result {
        Ok(model) => {
            tracing::info!(model = name, "model ready");
            Some(model)
        }
        Err(error) => {
            tracing::warn!(model = name, %error, "model unavailable; its endpoint will reject");
            None
        }
    }
}

fn load_classifier(paths: &ClassifierPaths) -> Result<ImageClassifier, ApiError> {
    let session = loader::load_onnx(&paths.model)?;
    let labels: Vec<String> = loader::load_artifact(&paths.labels)?;
    Ok(ImageClassifier {
        session: Mutex::new(session),
        labels,
    })
}

fn load_duration_models(paths: &TrafficPaths) -> Result<DurationModels, ApiError> {
    let regression: RegressionModel = loader::load_artifact(&paths.model)?;
    regression.validate()?;
    let encoder: WeatherEncoder = loader::load_artifact(&paths.weather_encoder)?;
    if encoder.known_categories().is_empty() {
        return Err(ApiError::Internal(
            "weather encoder artifact has no classes".to_string(),
        ));
    }
    Ok(DurationModels {
        regression,
        encoder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_json(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_context_has_no_models() {
        let ctx = ModelContext::empty();
        assert!(ctx.classifier.is_none());
        assert!(ctx.donation_forecast.is_none());
        assert!(ctx.request_forecast.is_none());
        assert!(ctx.duration.is_none());
    }

    #[test]
    fn test_load_with_default_paths_is_empty() {
        let ctx = ModelContext::load(&ModelPaths::default());
        assert!(ctx.classifier.is_none());
        assert!(ctx.duration.is_none());
    }

    #[test]
    fn test_load_duration_models_from_artifacts() {
        let model = temp_json(r#"{"weights": [0.001, 1.8, 45.0, 12.5], "intercept": 65.0}"#);
        let encoder = temp_json(r#"{"classes": ["Clear", "Clouds", "Rain"]}"#);

        let paths = ModelPaths {
            traffic: Some(TrafficPaths {
                model: model.path().to_path_buf(),
                weather_encoder: encoder.path().to_path_buf(),
            }),
            ..ModelPaths::default()
        };

        let ctx = ModelContext::load(&paths);
        let duration = ctx.duration.expect("duration models should load");
        assert_eq!(duration.encoder.encode("Rain"), Some(2));
    }

    #[test]
    fn test_load_survives_missing_artifacts() {
        let paths = ModelPaths {
            donation_forecast: Some("no/such/file.json".into()),
            traffic: Some(TrafficPaths {
                model: "missing_model.json".into(),
                weather_encoder: "missing_encoder.json".into(),
            }),
            ..ModelPaths::default()
        };

        let ctx = ModelContext::load(&paths);
        assert!(ctx.donation_forecast.is_none());
        assert!(ctx.duration.is_none());
    }

    #[test]
    fn test_load_rejects_wrong_weight_count() {
        let model = temp_json(r#"{"weights": [1.0, 2.0], "intercept": 0.0}"#);
        let encoder = temp_json(r#"{"classes": ["Clear"]}"#);

        let paths = ModelPaths {
            traffic: Some(TrafficPaths {
                model: model.path().to_path_buf(),
                weather_encoder: encoder.path().to_path_buf(),
            }),
            ..ModelPaths::default()
        };

        assert!(ModelContext::load(&paths).duration.is_none());
    }

    #[test]
    fn test_load_rejects_empty_encoder() {
        let model = temp_json(r#"{"weights": [0.1, 0.2, 0.3, 0.4], "intercept": 0.0}"#);
        let encoder = temp_json(r#"{"classes": []}"#);

        let paths = ModelPaths {
            traffic: Some(TrafficPaths {
                model: model.path().to_path_buf(),
                weather_encoder: encoder.path().to_path_buf(),
            }),
            ..ModelPaths::default()
        };

        assert!(ModelContext::load(&paths).duration.is_none());
    }
}
