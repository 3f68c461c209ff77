//! Search history endpoints.
//!
//! - GET    /api/v1/history
//! - DELETE /api/v1/history

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::routes::AppState;

/// Recent searches, most recent first (at most 5).
#[utoipa::path(
    get,
    path = "/api/v1/history",
    tag = "History",
    responses(
        (status = 200, description = "Recent searches", body = Vec<String>),
    )
)]
pub async fn get_history(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.preferences.history())
}

#[utoipa::path(
    delete,
    path = "/api/v1/history",
    tag = "History",
    responses(
        (status = 204, description = "History cleared"),
    )
)]
pub async fn clear_history(State(state): State<AppState>) -> StatusCode {
    state.preferences.clear_history();
    StatusCode::NO_CONTENT
}
