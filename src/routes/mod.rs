use std::sync::Arc;

use tokio::sync::watch;

use crate::services::dashboard::SharedDashboard;
use crate::services::openweather::OpenWeatherClient;
use crate::services::preferences::{Preferences, UserSettings};

pub mod dashboard;
pub mod favorites;
pub mod health;
pub mod history;
pub mod settings;
pub mod weather;

/// Shared application state for the weather and dashboard endpoints.
#[derive(Clone)]
pub struct AppState {
    pub client: OpenWeatherClient,
    pub dashboard: SharedDashboard,
    pub preferences: Preferences,
    /// Publishes settings changes to the background refresher.
    pub settings_tx: Arc<watch::Sender<UserSettings>>,
}

impl AppState {
    pub fn new(client: OpenWeatherClient, dashboard: SharedDashboard, preferences: Preferences) -> Self {
        let (settings_tx, _) = watch::channel(preferences.settings());
        Self {
            client,
            dashboard,
            preferences,
            settings_tx: Arc::new(settings_tx),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::AppState;
    use crate::app::create_router;
    use crate::config::AppMode;
    use crate::services::dashboard::Dashboard;
    use crate::services::openweather::OpenWeatherClient;
    use crate::services::preferences::Preferences;
    use crate::services::storage::MemoryStore;

    pub fn state_for(base_url: &str) -> AppState {
        let client = OpenWeatherClient::new(base_url, "test-key", Duration::from_secs(5)).unwrap();
        AppState::new(
            client,
            Arc::new(Dashboard::new()),
            Preferences::new(Arc::new(MemoryStore::new())),
        )
    }

    pub fn router(state: AppState) -> Router {
        create_router(state, AppMode::Development)
    }

    pub async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Mounts a provider answering any city with Lisbon and a one-entry forecast.
    pub async fn mount_lisbon(server: &wiremock::MockServer) {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, ResponseTemplate};

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "coord": { "lat": 38.72, "lon": -9.14 },
                "weather": [{ "main": "Clear", "icon": "01d" }],
                "main": { "temp": 293.15, "feels_like": 292.15, "pressure": 1016, "humidity": 55 },
                "wind": { "speed": 4.0 },
                "visibility": 10000,
                "dt": 1772366400,
                "timezone": 0,
                "sys": { "country": "PT" },
                "name": "Lisbon"
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [{
                    "dt": 1772366400,
                    "main": { "temp": 295.15, "pressure": 1015, "humidity": 50 },
                    "weather": [{ "main": "Clear", "icon": "01d" }],
                    "wind": { "speed": 5.0 }
                }]
            })))
            .mount(server)
            .await;
    }
}
