use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Everything an endpoint can answer with besides a prediction.
///
/// The first four variants are client-caused and non-retryable; the message
/// names the offending field (and the accepted set where one exists) so the
/// caller can self-correct. Server-side variants render a generic body and
/// keep the detail in the logs.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("missing required field(s): {fields}")]
    MissingField { fields: String },

    #[error("invalid value for {field}: expected {expected}")]
    InvalidFormat {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{field} out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },

    #[error("unrecognized {field} \"{value}\"; accepted values: {accepted}")]
    UnknownCategory {
        field: &'static str,
        value: String,
        accepted: String,
    },

    #[error("image decoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("model not loaded: {0}")]
    ModelUnavailable(&'static str),

    #[error("model artifact not found at path: {0}")]
    ArtifactNotFound(String),

    #[error("failed to parse model artifact {path}: {source}")]
    ArtifactFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn missing_fields(names: &[&str]) -> Self {
        ApiError::MissingField {
            fields: names.join(", "),
        }
    }

    pub fn unknown_category<I, S>(field: &'static str, value: &str, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let accepted = accepted
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        ApiError::UnknownCategory {
            field,
            value: value.to_string(),
            accepted,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::MissingField { .. }
            | ApiError::InvalidFormat { .. }
            | ApiError::OutOfRange { .. }
            | ApiError::UnknownCategory { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::ImageError(_) => (StatusCode::BAD_REQUEST, "invalid image data".to_string()),
            ApiError::ModelUnavailable(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
