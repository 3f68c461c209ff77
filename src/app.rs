use axum::http::Method;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppMode;
use crate::routes::{self, AppState};
use crate::services;

/// Weather Dashboard API OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Dashboard API",
        version = "0.1.0",
        description = "City and coordinate weather search backed by OpenWeatherMap. \
            Normalizes the provider's 3-hour forecast into a 24-point hourly series \
            and up to 7 daily summaries, and keeps a small dashboard state: the \
            displayed result, search history, favorites and display settings.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Stateless weather query"),
        (name = "Dashboard", description = "Displayed result and searches"),
        (name = "History", description = "Recent searches"),
        (name = "Favorites", description = "Saved locations"),
        (name = "Settings", description = "Display units and auto-refresh"),
    ),
    paths(
        routes::health::health_check,
        routes::weather::get_weather,
        routes::dashboard::search_location,
        routes::dashboard::get_dashboard,
        routes::history::get_history,
        routes::history::clear_history,
        routes::favorites::list_favorites,
        routes::favorites::add_favorite,
        routes::favorites::remove_favorite,
        routes::settings::get_settings,
        routes::settings::update_settings,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::dashboard::SearchRequest,
            routes::dashboard::DashboardResponse,
            services::aggregator::WeatherBundle,
            services::aggregator::CurrentConditions,
            services::aggregator::HourlyPoint,
            services::aggregator::DailyAggregate,
            services::openweather::Coordinates,
            services::dashboard::SearchOutcome,
            services::dashboard::DisplayedResult,
            services::dashboard::DisplayConditions,
            services::dashboard::DisplayDay,
            services::preferences::Favorite,
            services::preferences::NewFavorite,
            services::preferences::UserSettings,
            services::preferences::Theme,
            crate::units::TemperatureUnit,
            crate::units::WindUnit,
            crate::units::PressureUnit,
            crate::errors::ErrorResponse,
        )
    )
)]
pub struct ApiDoc;

/// Build the full HTTP router.
pub fn create_router(state: AppState, mode: AppMode) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/api/v1/weather", get(routes::weather::get_weather))
        .route("/api/v1/dashboard", get(routes::dashboard::get_dashboard))
        .route(
            "/api/v1/dashboard/search",
            post(routes::dashboard::search_location),
        )
        .route(
            "/api/v1/history",
            get(routes::history::get_history).delete(routes::history::clear_history),
        )
        .route(
            "/api/v1/favorites",
            get(routes::favorites::list_favorites).post(routes::favorites::add_favorite),
        )
        .route(
            "/api/v1/favorites/:id",
            delete(routes::favorites::remove_favorite),
        )
        .route(
            "/api/v1/settings",
            get(routes::settings::get_settings).put(routes::settings::update_settings),
        )
        .with_state(state);

    // Health check only needs the runtime mode
    let health_routes = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .with_state(mode);

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
