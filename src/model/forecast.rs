use chrono::{Datelike, Days, NaiveDate};
use serde::Deserialize;

/// Additive time-series forecaster exported by the offline training run:
/// a linear trend anchored at the end of the training history plus weekly
/// seasonal offsets and a symmetric uncertainty interval. Consumed as an
/// opaque `horizon -> series` function.
#[derive(Deserialize, Clone, Debug)]
pub struct ForecastModel {
    /// Last date of the training history; forecasts start the day after.
    pub last_date: NaiveDate,
    /// Trend value on `last_date`.
    pub level: f64,
    /// Trend increment per forecast day.
    pub slope: f64,
    /// Seasonal offsets by weekday, Monday first.
    pub weekly: [f64; 7],
    /// Half-width of the interval around the point estimate.
    pub interval_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

impl ForecastModel {
    /// One point per future day, covering `horizon_days` consecutive dates
    /// after the training history.
    pub fn forecast(&self, horizon_days: u32) -> Vec<ForecastPoint> {
        (1..=u64::from(horizon_days))
            .map(|day| {
                let ds = self.last_date + Days::new(day);
                let weekday = ds.weekday().num_days_from_monday() as usize;
                let yhat = self.level + self.slope * day as f64 + self.weekly[weekday];
                ForecastPoint {
                    ds,
                    yhat,
                    yhat_lower: yhat - self.interval_width,
                    yhat_upper: yhat + self.interval_width,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_model() -> ForecastModel {
        ForecastModel {
            // A Saturday.
            last_date: NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
            level: 40.0,
            slope: 0.0,
            weekly: [0.0; 7],
            interval_width: 5.0,
        }
    }

    #[test]
    fn test_forecast_length_matches_horizon() {
        assert_eq!(flat_model().forecast(30).len(), 30);
        assert_eq!(flat_model().forecast(1).len(), 1);
        assert!(flat_model().forecast(0).is_empty());
    }

    #[test]
    fn test_forecast_dates_are_consecutive_after_history() {
        let points = flat_model().forecast(3);
        let expected = [
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
        ];
        let dates: Vec<NaiveDate> = points.iter().map(|p| p.ds).collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn test_trend_accumulates_per_day() {
        let model = ForecastModel {
            slope: 0.5,
            ..flat_model()
        };
        let points = model.forecast(4);
        assert!((points[0].yhat - 40.5).abs() < 1e-12);
        assert!((points[3].yhat - 42.0).abs() < 1e-12);
    }

    #[test]
    fn test_weekly_offset_follows_weekday() {
        let model = ForecastModel {
            weekly: [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
            ..flat_model()
        };
        // 2025-06-01 is a Sunday, 2025-06-02 a Monday.
        let points = model.forecast(2);
        assert!((points[0].yhat - 47.0).abs() < 1e-12);
        assert!((points[1].yhat - 41.0).abs() < 1e-12);
    }

    #[test]
    fn test_interval_brackets_point_estimate() {
        let points = flat_model().forecast(10);
        for point in points {
            assert!(point.yhat_lower <= point.yhat);
            assert!(point.yhat <= point.yhat_upper);
            assert!((point.yhat_upper - point.yhat_lower - 10.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_deserializes_from_artifact_json() {
        let model: ForecastModel = serde_json::from_str(
            r#"{
                "last_date": "2025-05-31",
                "level": 46.2,
                "slope": 0.35,
                "weekly": [1.0, 0.5, 0.0, -0.5, 2.0, 4.0, 3.0],
                "interval_width": 11.4
            }"#,
        )
        .unwrap();
        assert_eq!(model.last_date, NaiveDate::from_ymd_opt(2025, 5, 31).unwrap());
        assert_eq!(model.forecast(5).len(), 5);
    }
}
