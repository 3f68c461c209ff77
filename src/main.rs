// Weather Dashboard API v0.1
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weather_dashboard_api::app::create_router;
use weather_dashboard_api::config::{AppConfig, LogFormat};
use weather_dashboard_api::routes::AppState;
use weather_dashboard_api::services::dashboard::Dashboard;
use weather_dashboard_api::services::openweather::OpenWeatherClient;
use weather_dashboard_api::services::preferences::Preferences;
use weather_dashboard_api::services::refresher::run_refresher;
use weather_dashboard_api::services::storage::MemoryStore;

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "weather_dashboard_api=debug,tower_http=debug".into());

    let (pretty, json) = match format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();
}

#[tokio::main]
async fn main() {
    // Logging comes up before the config so config problems are reported
    init_tracing(LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref()));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Starting in {} mode (provider {}, timeout {}s)",
        config.mode.as_str(),
        config.provider_base_url,
        config.provider_timeout_secs
    );

    let client = match OpenWeatherClient::new(
        &config.provider_base_url,
        &config.api_key,
        Duration::from_secs(config.provider_timeout_secs),
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to build weather provider client: {}", e);
            std::process::exit(1);
        }
    };

    // Build shared application state
    let dashboard = Arc::new(Dashboard::new());
    let preferences = Preferences::new(Arc::new(MemoryStore::new()));
    let state = AppState::new(client.clone(), dashboard.clone(), preferences);

    // Spawn background auto-refresher
    let refresher = tokio::spawn(run_refresher(
        client,
        dashboard,
        state.settings_tx.subscribe(),
    ));

    let app = create_router(state, config.mode);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    let served = axum::serve(listener, app).await;

    refresher.abort();
    if let Err(e) = served {
        tracing::error!("Server terminated unexpectedly: {}", e);
        std::process::exit(1);
    }
}
