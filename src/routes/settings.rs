//! User settings endpoints.
//!
//! - GET /api/v1/settings
//! - PUT /api/v1/settings (full replacement; omitted fields take defaults)

use axum::extract::State;
use axum::Json;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::AppState;
use crate::services::preferences::UserSettings;

#[utoipa::path(
    get,
    path = "/api/v1/settings",
    tag = "Settings",
    responses(
        (status = 200, description = "Current settings", body = UserSettings),
    )
)]
pub async fn get_settings(State(state): State<AppState>) -> Json<UserSettings> {
    Json(state.preferences.settings())
}

/// Replace the settings. The background refresher picks up a new
/// `refreshIntervalMinutes` immediately.
#[utoipa::path(
    put,
    path = "/api/v1/settings",
    tag = "Settings",
    request_body = UserSettings,
    responses(
        (status = 200, description = "Saved settings", body = UserSettings),
        (status = 400, description = "Invalid settings", body = ErrorResponse),
    )
)]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<UserSettings>,
) -> Result<Json<UserSettings>, AppError> {
    let saved = state.preferences.update_settings(settings)?;
    state.settings_tx.send_replace(saved.clone());
    tracing::info!(
        "Settings updated (refresh every {} min)",
        saved.refresh_interval_minutes
    );
    Ok(Json(saved))
}
