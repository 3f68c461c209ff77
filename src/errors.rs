use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Error body returned when `q` is absent or blank.
pub const MISSING_QUERY_MESSAGE: &str = "Missing query parameter q (city name or lat,lon)";
/// Error body returned when a name lookup fails at the provider.
pub const CITY_NOT_FOUND_MESSAGE: &str = "City not found";

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No location supplied. User-correctable.
    #[error("{}", MISSING_QUERY_MESSAGE)]
    MissingQuery,

    /// The current-conditions lookup failed. Carries the provider's HTTP status
    /// (or a gateway status when the provider could not be reached).
    #[error("Location not found (provider status {status}): {detail}")]
    LocationNotFound { status: StatusCode, detail: String },

    /// The provider answered successfully but without usable coordinates.
    #[error("Coordinates unavailable for the resolved location")]
    CoordinatesUnavailable,

    /// The forecast lookup failed after coordinates were resolved.
    #[error("Forecast unavailable: {0}")]
    ForecastUnavailable(String),

    /// A raw provider entry had an unusable shape (e.g. no timestamp).
    #[error("Aggregation error: {0}")]
    AggregationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingQuery | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::LocationNotFound { status, .. } => *status,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CoordinatesUnavailable
            | AppError::ForecastUnavailable(_)
            | AppError::AggregationError(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::MissingQuery => MISSING_QUERY_MESSAGE.to_string(),
            AppError::LocationNotFound { detail, .. } => {
                tracing::warn!("Location lookup failed with {}: {}", status, detail);
                CITY_NOT_FOUND_MESSAGE.to_string()
            }
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg.clone(),
            other => {
                tracing::error!("Request failed: {}", other);
                other.to_string()
            }
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}
