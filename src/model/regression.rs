use crate::error::ApiError;
use serde::Deserialize;

/// Input width of the traffic model: distance in meters, routing duration in
/// minutes, hour of day scaled to [0, 1], encoded weather category.
pub const FEATURE_DIM: usize = 4;

/// Linear regression over trip features, exported by the offline training
/// run as a weight vector plus intercept. Consumed as an opaque
/// feature-vector-to-scalar function.
#[derive(Deserialize, Clone, Debug)]
pub struct RegressionModel {
    weights: Vec<f64>,
    intercept: f64,
}

impl RegressionModel {
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self { weights, intercept }
    }

    /// Rejects artifacts whose weight count does not match the serving
    /// feature layout. Run once at load so `predict` failures at request
    /// time only mean a caller-side bug.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.weights.len() != FEATURE_DIM {
            return Err(ApiError::Internal(format!(
                "traffic model expects {} weights, artifact has {}",
                FEATURE_DIM,
                self.weights.len()
            )));
        }
        Ok(())
    }

    pub fn predict(&self, features: &[f64]) -> Result<f64, ApiError> {
        if features.len() != self.weights.len() {
            return Err(ApiError::Internal(format!(
                "feature vector has {} entries, model expects {}",
                features.len(),
                self.weights.len()
            )));
        }
        let dot: f64 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum();
        Ok(dot + self.intercept)
    }
}
