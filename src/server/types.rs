use crate::model::context::ModelContext;
use crate::model::forecast::ForecastPoint;
use serde::{Deserialize, Serialize};

/// Shared Application State
pub struct AppState {
    pub models: ModelContext,
}

// --- DTOs (Data Transfer Objects) ---

// Image Analysis
#[derive(Serialize, Debug)]
pub struct LabelScore {
    pub description: String,
    pub confidence: f32,
}

// Forecasting
#[derive(Deserialize)]
pub struct ForecastParams {
    /// Horizon in days; stays a string so the handler controls parse errors.
    pub days: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ForecastRow {
    pub ds: String,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

impl From<ForecastPoint> for ForecastRow {
    fn from(point: ForecastPoint) -> Self {
        ForecastRow {
            ds: point.ds.format("%Y-%m-%d").to_string(),
            yhat: point.yhat,
            yhat_lower: point.yhat_lower,
            yhat_upper: point.yhat_upper,
        }
    }
}

// Duration Prediction
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DurationResponse {
    pub predicted_duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_forecast_row_formats_date() {
        let point = ForecastPoint {
            ds: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            yhat: 42.0,
            yhat_lower: 30.0,
            yhat_upper: 54.0,
        };
        let row = ForecastRow::from(point);
        assert_eq!(row.ds, "2025-06-01");
        assert_eq!(row.yhat, 42.0);
    }

    #[test]
    fn test_duration_response_uses_camel_case() {
        let body = serde_json::to_value(DurationResponse {
            predicted_duration: 360.0,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"predictedDuration": 360.0}));
    }
}
