//! Favorite location endpoints.
//!
//! - GET    /api/v1/favorites
//! - POST   /api/v1/favorites
//! - DELETE /api/v1/favorites/:id

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::AppState;
use crate::services::preferences::{Favorite, NewFavorite};

#[utoipa::path(
    get,
    path = "/api/v1/favorites",
    tag = "Favorites",
    responses(
        (status = 200, description = "Saved locations in the order they were added", body = Vec<Favorite>),
    )
)]
pub async fn list_favorites(State(state): State<AppState>) -> Json<Vec<Favorite>> {
    Json(state.preferences.favorites())
}

/// Save a location. The id is `"<name>-<country>"`; saving an existing id
/// returns the stored entry.
#[utoipa::path(
    post,
    path = "/api/v1/favorites",
    tag = "Favorites",
    request_body = NewFavorite,
    responses(
        (status = 200, description = "Saved favorite", body = Favorite),
        (status = 400, description = "Empty name", body = ErrorResponse),
    )
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    Json(new): Json<NewFavorite>,
) -> Result<Json<Favorite>, AppError> {
    let favorite = state.preferences.add_favorite(new, Utc::now())?;
    Ok(Json(favorite))
}

#[utoipa::path(
    delete,
    path = "/api/v1/favorites/{id}",
    tag = "Favorites",
    params(
        ("id" = String, Path, description = "Favorite id, e.g. \"Paris-FR\""),
    ),
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 404, description = "Favorite not found", body = ErrorResponse),
    )
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.preferences.remove_favorite(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
