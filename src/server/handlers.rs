use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, Query, State},
    Json,
};
use metrics::{counter, histogram};
use ndarray::Axis;
use ort::value::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::duration::{self, DurationRequest, RawDurationRequest};
use crate::error::ApiError;
use crate::model::forecast::ForecastModel;
use crate::server::types::*;

const DEFAULT_FORECAST_DAYS: u32 = 30;
const MAX_FORECAST_DAYS: i64 = 365;
/// How many labels `/analyze` reports, best first.
const TOP_PREDICTIONS: usize = 3;

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<LabelScore>>, ApiError> {
    counter!("requests_total", 1, "endpoint" => "analyze");
    let start = Instant::now();

    // 1. Pull the image out of the multipart body
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "request body is not multipart");
        invalid_upload()
    })?;
    let mut image_bytes = None;
    while let Some(field) = multipart.next_field().await.map_err(|error| {
        tracing::debug!(%error, "malformed multipart body");
        invalid_upload()
    })? {
        if field.name() == Some("file") {
            image_bytes = Some(field.bytes().await.map_err(|error| {
                tracing::debug!(%error, "failed to read file field");
                invalid_upload()
            })?);
            break;
        }
    }
    let image_bytes = image_bytes.ok_or_else(|| ApiError::missing_fields(&["file"]))?;

    // 2. Preprocess
    let input_tensor = crate::preprocessing::image::process_bytes(&image_bytes)?;

    // 3. Inference
    let classifier = state
        .models
        .classifier
        .as_ref()
        .ok_or(ApiError::ModelUnavailable("image classifier"))?;
    let shape = input_tensor.shape().to_vec();
    let data = input_tensor.into_raw_vec().into_boxed_slice();
    let input_value = Value::from_array((shape, data))?;

    let mut session = classifier
        .session
        .lock()
        .map_err(|_| ApiError::Internal("classifier session lock poisoned".to_string()))?;
    let input_name = session
        .inputs
        .first()
        .map(|input| input.name.clone())
        .ok_or_else(|| ApiError::Internal("classifier model has no inputs".to_string()))?;
    let outputs = session.run(ort::inputs![input_name => input_value])?;

    // 4. Post-process
    let (out_shape, out_data) = outputs[0].try_extract_tensor::<f32>()?;
    let dims: Vec<usize> = out_shape.iter().map(|&x| x as usize).collect();
    let output = ndarray::ArrayViewD::from_shape(dims.as_slice(), out_data)
        .map_err(|e| ApiError::Internal(format!("unexpected classifier output shape: {e}")))?;
    let scores = output.index_axis(Axis(0), 0);

    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let results: Vec<LabelScore> = ranked
        .iter()
        .take(TOP_PREDICTIONS)
        .map(|&(class, confidence)| LabelScore {
            description: classifier
                .labels
                .get(class)
                .cloned()
                .unwrap_or_else(|| format!("class {class}")),
            confidence,
        })
        .collect();

    let elapsed = start.elapsed();
    histogram!("request_latency_seconds", elapsed.as_secs_f64(), "endpoint" => "analyze");
    tracing::info!(
        top_label = results.first().map(|r| r.description.as_str()),
        inference_time_ms = elapsed.as_secs_f64() * 1000.0,
        "image analyzed"
    );

    Ok(Json(results))
}

pub async fn forecast_donations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ForecastParams>,
) -> Result<Json<Vec<ForecastRow>>, ApiError> {
    run_forecast(
        state.models.donation_forecast.as_ref(),
        "donation forecast model",
        "forecast_donations",
        &params,
    )
}

pub async fn forecast_requests(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ForecastParams>,
) -> Result<Json<Vec<ForecastRow>>, ApiError> {
    run_forecast(
        state.models.request_forecast.as_ref(),
        "request forecast model",
        "forecast_requests",
        &params,
    )
}

fn run_forecast(
    model: Option<&ForecastModel>,
    what: &'static str,
    endpoint: &'static str,
    params: &ForecastParams,
) -> Result<Json<Vec<ForecastRow>>, ApiError> {
    counter!("requests_total", 1, "endpoint" => endpoint);
    let start = Instant::now();

    let model = model.ok_or(ApiError::ModelUnavailable(what))?;
    let days = parse_days(params)?;
    let rows: Vec<ForecastRow> = model
        .forecast(days)
        .into_iter()
        .map(ForecastRow::from)
        .collect();

    histogram!("request_latency_seconds", start.elapsed().as_secs_f64(), "endpoint" => endpoint);
    tracing::info!(endpoint, days, rows = rows.len(), "forecast served");
    Ok(Json(rows))
}

/// Absent `days` means a 30-day horizon. Anything present must be an
/// integer between 1 and 365.
fn parse_days(params: &ForecastParams) -> Result<u32, ApiError> {
    let raw = match params.days.as_deref() {
        None => return Ok(DEFAULT_FORECAST_DAYS),
        Some(raw) => raw,
    };
    let days: i64 = raw.trim().parse().map_err(|_| ApiError::InvalidFormat {
        field: "days",
        expected: "an integer",
    })?;
    if !(1..=MAX_FORECAST_DAYS).contains(&days) {
        return Err(ApiError::OutOfRange {
            field: "days",
            detail: "must be between 1 and 365",
        });
    }
    Ok(days as u32)
}

pub async fn predict_duration(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawDurationRequest>, JsonRejection>,
) -> Result<Json<DurationResponse>, ApiError> {
    counter!("requests_total", 1, "endpoint" => "predict_duration");
    let start = Instant::now();

    // The model check comes first: a half-configured deployment answers 500
    // for every request, well-formed or not.
    let models = state
        .models
        .duration
        .as_ref()
        .ok_or(ApiError::ModelUnavailable("traffic duration model"))?;

    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(%rejection, "duration request body rejected");
        ApiError::InvalidFormat {
            field: "request body",
            expected: "a JSON object",
        }
    })?;
    tracing::debug!(?payload, "duration request received");

    let request = DurationRequest::from_raw(&payload, &models.encoder)?;
    let predicted_duration = duration::estimate(models, &request)?;

    histogram!("request_latency_seconds", start.elapsed().as_secs_f64(), "endpoint" => "predict_duration");
    Ok(Json(DurationResponse { predicted_duration }))
}

fn invalid_upload() -> ApiError {
    ApiError::InvalidFormat {
        field: "file",
        expected: "a multipart file upload",
    }
}
