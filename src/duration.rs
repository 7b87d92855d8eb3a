//! Delivery-duration estimation.
//!
//! Requests are validated fail-fast; the first violation wins, in the order
//! presence, format, range, category membership. The served duration is then
//! the routing service's estimate scaled by three rule-based factors, capped:
//!
//! - traffic: 1.2 during evening rush (hour 17-20), else 1.1
//! - weather: 1.0 for Clear, else 1.3
//! - vehicle: Car 1.0, Motorcycle 0.9, Truck 1.3
//!
//! The learned traffic model runs on every request too, but its raw output
//! is only logged; it stays out of the served value until its units are
//! calibrated against production trips.

use crate::error::ApiError;
use crate::model::context::DurationModels;
use crate::model::encoder::WeatherEncoder;
use crate::model::regression::FEATURE_DIM;
use serde::Deserialize;
use serde_json::Value;

/// Hard ceiling on any served duration, in seconds.
pub const MAX_DURATION_SECS: f64 = 600.0;

/// Wire shape of a `/predict_duration` request. Every field stays optional
/// and untyped at this layer so presence, format, and range each get their
/// own rejection instead of one opaque deserialization failure.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawDurationRequest {
    pub distance: Option<Value>,
    pub osrm_duration: Option<Value>,
    pub hour: Option<Value>,
    pub weather: Option<Value>,
    pub vehicle_type: Option<Value>,
}

/// A fully validated duration request. Constructing one through
/// [`DurationRequest::from_raw`] is the only path, so holding a value means
/// every field passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationRequest {
    pub distance_km: f64,
    pub osrm_duration_secs: f64,
    pub hour: u8,
    /// Title-normalized weather category, member of the encoder's known set.
    pub weather: String,
    /// The encoder's code for `weather`.
    pub weather_code: usize,
    pub vehicle: VehicleType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleType {
    Car,
    Motorcycle,
    Truck,
}

impl VehicleType {
    pub const ACCEPTED: [&'static str; 3] = ["Car", "Motorcycle", "Truck"];

    fn from_normalized(value: &str) -> Option<Self> {
        match value {
            "Car" => Some(VehicleType::Car),
            "Motorcycle" => Some(VehicleType::Motorcycle),
            "Truck" => Some(VehicleType::Truck),
            _ => None,
        }
    }

    fn factor(self) -> f64 {
        match self {
            VehicleType::Car => 1.0,
            VehicleType::Motorcycle => 0.9,
            VehicleType::Truck => 1.3,
        }
    }
}

impl DurationRequest {
    /// Validates and normalizes a raw request. Fail-fast: absent fields are
    /// all reported at once, then format, range, and category checks stop at
    /// the first violation, in field declaration order.
    pub fn from_raw(raw: &RawDurationRequest, encoder: &WeatherEncoder) -> Result<Self, ApiError> {
        let mut missing = Vec::new();
        let distance = non_null(&raw.distance, "distance", &mut missing);
        let osrm_duration = non_null(&raw.osrm_duration, "osrmDuration", &mut missing);
        let hour = non_null(&raw.hour, "hour", &mut missing);
        let weather = non_null(&raw.weather, "weather", &mut missing);
        let vehicle_type = non_null(&raw.vehicle_type, "vehicleType", &mut missing);
        let (Some(distance), Some(osrm_duration), Some(hour), Some(weather), Some(vehicle_type)) =
            (distance, osrm_duration, hour, weather, vehicle_type)
        else {
            return Err(ApiError::missing_fields(&missing));
        };

        let distance_km = coerce_f64(distance, "distance")?;
        let osrm_duration_secs = coerce_f64(osrm_duration, "osrmDuration")?;
        let hour = coerce_i64(hour, "hour")?;
        let weather_input = coerce_str(weather, "weather")?;
        let vehicle_input = coerce_str(vehicle_type, "vehicleType")?;

        if distance_km <= 0.0 {
            return Err(ApiError::OutOfRange {
                field: "distance",
                detail: "must be greater than 0",
            });
        }
        if osrm_duration_secs <= 0.0 {
            return Err(ApiError::OutOfRange {
                field: "osrmDuration",
                detail: "must be greater than 0",
            });
        }
        if !(0..=23).contains(&hour) {
            return Err(ApiError::OutOfRange {
                field: "hour",
                detail: "must be between 0 and 23",
            });
        }

        let weather = title_case(weather_input);
        let weather_code = encoder.encode(&weather).ok_or_else(|| {
            ApiError::unknown_category("weather", weather_input, encoder.known_categories())
        })?;

        let vehicle = VehicleType::from_normalized(&title_case(vehicle_input)).ok_or_else(|| {
            ApiError::unknown_category("vehicleType", vehicle_input, VehicleType::ACCEPTED)
        })?;

        Ok(DurationRequest {
            distance_km,
            osrm_duration_secs,
            hour: hour as u8,
            weather,
            weather_code,
            vehicle,
        })
    }
}

/// Serves the final duration for a validated request: the routing estimate
/// scaled by the three factors, capped at [`MAX_DURATION_SECS`].
///
/// The regression model's raw prediction is computed and logged as a
/// calibration signal but never reaches the served value.
pub fn estimate(models: &DurationModels, request: &DurationRequest) -> Result<f64, ApiError> {
    let features: [f64; FEATURE_DIM] = [
        request.distance_km * 1000.0,
        request.osrm_duration_secs / 60.0,
        f64::from(request.hour) / 23.0,
        request.weather_code as f64,
    ];
    let raw_estimate = models.regression.predict(&features)?;
    tracing::debug!(?features, raw_estimate, "traffic model raw output");

    let traffic_factor = if (17..=20).contains(&request.hour) {
        1.2
    } else {
        1.1
    };
    let weather_factor = if request.weather == "Clear" { 1.0 } else { 1.3 };
    let vehicle_factor = request.vehicle.factor();

    let adjusted = request.osrm_duration_secs * traffic_factor * weather_factor * vehicle_factor;
    let predicted = adjusted.min(MAX_DURATION_SECS);

    tracing::info!(
        distance_km = request.distance_km,
        osrm_duration_secs = request.osrm_duration_secs,
        hour = request.hour,
        weather = %request.weather,
        weather_code = request.weather_code,
        vehicle = ?request.vehicle,
        traffic_factor,
        weather_factor,
        vehicle_factor,
        raw_estimate,
        predicted_duration = predicted,
        "duration estimate served"
    );

    Ok(predicted)
}

/// "clear", "CLEAR", and "Clear" all normalize to "Clear".
fn title_case(value: &str) -> String {
    let mut chars = value.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Absent and null fields are recorded in `missing`; anything else passes
/// through to coercion.
fn non_null<'v>(
    value: &'v Option<Value>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<&'v Value> {
    let present = value.as_ref().filter(|v| !v.is_null());
    if present.is_none() {
        missing.push(field);
    }
    present
}

fn coerce_f64(value: &Value, field: &'static str) -> Result<f64, ApiError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or(ApiError::InvalidFormat {
            field,
            expected: "a number",
        })
}

fn coerce_i64(value: &Value, field: &'static str) -> Result<i64, ApiError> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or(ApiError::InvalidFormat {
        field,
        expected: "an integer",
    })
}

fn coerce_str<'v>(value: &'v Value, field: &'static str) -> Result<&'v str, ApiError> {
    value.as_str().ok_or(ApiError::InvalidFormat {
        field,
        expected: "a string",
    })
}
