use crate::error::ApiError;
use ort::session::{builder::GraphOptimizationLevel, Session};
use serde::de::DeserializeOwned;
use std::path::Path;

// Initialize the global environment for ORT (only needed once)
pub fn init_ort() -> Result<(), ApiError> {
    ort::init().with_name("mealbridge").commit()?;
    Ok(())
}

/// Loads an ONNX model from disk and creates an inference session.
///
/// # Arguments
/// * `model_path` - Path to the .onnx file
pub fn load_onnx(model_path: impl AsRef<Path>) -> Result<Session, ApiError> {
    let path = model_path.as_ref();
    if !path.exists() {
        return Err(ApiError::ArtifactNotFound(path.display().to_string()));
    }

    // Configure Session
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)? // Parallelism within an op
        .commit_from_file(path)?;

    tracing::info!(model = %path.display(), "loaded ONNX model");
    for (i, input) in session.inputs.iter().enumerate() {
        tracing::debug!(index = i, name = %input.name, ty = ?input.input_type, "model input");
    }

    Ok(session)
}

/// Reads a JSON model artifact (forecast parameters, regression weights,
/// encoder classes) exported by the offline training pipeline.
pub fn load_artifact<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ApiError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ApiError::ArtifactNotFound(path.display().to_string()));
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ApiError::Internal(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|source| ApiError::ArtifactFormat {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::encoder::WeatherEncoder;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_artifact_nonexistent_file() {
        let result: Result<WeatherEncoder, _> = load_artifact("nonexistent_encoder.json");
        match result {
            Err(ApiError::ArtifactNotFound(_)) => {}
            _ => panic!("Expected ArtifactNotFound error"),
        }
    }

    #[test]
    fn test_load_artifact_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"not a json artifact").unwrap();

        let result: Result<WeatherEncoder, _> = load_artifact(temp_file.path());
        match result {
            Err(ApiError::ArtifactFormat { .. }) => {}
            _ => panic!("Expected ArtifactFormat error"),
        }
    }

    #[test]
    fn test_load_artifact_valid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"{"classes": ["Clear", "Rain", "Snow"]}"#)
            .unwrap();

        let encoder: WeatherEncoder = load_artifact(temp_file.path()).unwrap();
        assert_eq!(encoder.encode("Snow"), Some(2));
    }

    #[test]
    fn test_load_onnx_nonexistent_file() {
        let result = load_onnx("nonexistent_model.onnx");
        assert!(result.is_err());

        match result.unwrap_err() {
            ApiError::ArtifactNotFound(_) => {}
            _ => panic!("Expected ArtifactNotFound error"),
        }
    }

    #[test]
    fn test_load_onnx_with_invalid_file() {
        // Not a valid ONNX graph; loading should reach ORT and fail there.
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"definitely not protobuf").unwrap();

        let result = load_onnx(temp_file.path());
        match result {
            Err(ApiError::OrtError(_)) => {}
            Err(ApiError::ArtifactNotFound(_)) => {
                // Possible if the environment lacks an ORT runtime.
            }
            Err(_) => {}
            Ok(_) => panic!("Expected an error for a non-ONNX file"),
        }
    }
}
