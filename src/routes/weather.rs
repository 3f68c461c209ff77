//! Weather query endpoint.
//!
//! GET /api/v1/weather?q=<city or lat,lon>

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::AppState;
use crate::services::aggregator::WeatherBundle;
use crate::services::weather::resolve_weather;

#[derive(Debug, Deserialize, IntoParams)]
pub struct WeatherQuery {
    /// City name (e.g. "Lisbon") or coordinates as "lat,lon" (e.g. "38.72,-9.14")
    pub q: Option<String>,
}

/// Current conditions, 24-point hourly series and up to 7 daily summaries.
///
/// Temperatures are °C, wind km/h, pressure hPa and visibility km, all
/// integers. Readings the provider did not report are `null`.
#[utoipa::path(
    get,
    path = "/api/v1/weather",
    tag = "Weather",
    params(WeatherQuery),
    responses(
        (status = 200, description = "Normalized weather for the location", body = WeatherBundle),
        (status = 400, description = "Missing or blank q", body = ErrorResponse),
        (status = 404, description = "City not found (provider status is propagated)", body = ErrorResponse),
        (status = 500, description = "Forecast or aggregation failure", body = ErrorResponse),
    )
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> Result<Json<WeatherBundle>, AppError> {
    let q = params.q.ok_or(AppError::MissingQuery)?;
    let bundle = resolve_weather(&state.client, &q, Utc::now()).await?;
    Ok(Json(bundle))
}
