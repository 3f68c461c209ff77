//! Dashboard endpoints.
//!
//! - POST /api/v1/dashboard/search: run a search and try to display it
//! - GET  /api/v1/dashboard:        the displayed result in the user's units

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::AppState;
use crate::services::dashboard::{
    render_display, search, DisplayConditions, DisplayedResult, SearchOutcome,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// City name or "lat,lon"
    pub query: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub result: DisplayedResult,
    /// Headline values converted to the user's units
    pub display: DisplayConditions,
}

/// Search for a location and display it.
///
/// The query is added to search history before it is resolved. The result is
/// only displayed if no newer search started meanwhile (`committed`).
#[utoipa::path(
    post,
    path = "/api/v1/dashboard/search",
    tag = "Dashboard",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Search resolved", body = SearchOutcome),
        (status = 400, description = "Blank query", body = ErrorResponse),
        (status = 404, description = "City not found", body = ErrorResponse),
    )
)]
pub async fn search_location(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchOutcome>, AppError> {
    if request.query.trim().is_empty() {
        return Err(AppError::MissingQuery);
    }
    state.preferences.record_search(&request.query)?;
    let outcome = search(&state.client, &state.dashboard, &request.query).await?;
    Ok(Json(outcome))
}

/// Get the displayed result.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Displayed result", body = DashboardResponse),
        (status = 404, description = "Nothing searched yet", body = ErrorResponse),
    )
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let result = state
        .dashboard
        .current()
        .await
        .ok_or_else(|| AppError::NotFound("No location searched yet".to_string()))?;
    let settings = state.preferences.settings();
    let display = render_display(&result.weather.current, &result.weather.daily, &settings);
    Ok(Json(DashboardResponse { result, display }))
}
