//! OpenWeatherMap 2.5 client.
//!
//! Two endpoints are used, both queried without `units=`, so the payload stays
//! in provider-native units (kelvin, m/s, hPa, metres):
//!
//! - `/weather`  current conditions, by `q=<name>` or by `lat=&lon=`
//! - `/forecast` 5 day / 3 hour forecast, by `lat=&lon=` only
//!
//! Every numeric field of the raw payload is optional. Deciding what an absent
//! field means is the aggregator's job, not the transport's.
//! See: https://openweathermap.org/current and https://openweathermap.org/forecast5

use std::sync::LazyLock;
use std::time::Duration;

use axum::http::StatusCode;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

/// `"<lat>,<lon>"`, both parts plain decimals. Ranges are not checked.
static COORDINATE_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?\d+(\.\d+)?,\s*-?\d+(\.\d+)?$").expect("coordinate pattern is valid")
});

/// Longest provider error body quoted in logs and error details.
const MAX_ERROR_BODY_LEN: usize = 200;

/// Latitude / longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A location query after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    /// Free-text name, resolved through the provider's name lookup.
    Name(String),
    /// Explicit coordinates, no name lookup needed.
    Coordinates(Coordinates),
}

/// Classify a raw `q` value.
///
/// Blank input is `MissingQuery`. Anything matching the coordinate pattern is
/// parsed as coordinates, everything else (including `"Paris,France"`) is a name.
pub fn parse_location_query(raw: &str) -> Result<LocationQuery, AppError> {
    let query = raw.trim();
    if query.is_empty() {
        return Err(AppError::MissingQuery);
    }

    if COORDINATE_QUERY.is_match(query) {
        if let Some((lat, lon)) = query.split_once(',') {
            if let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
                return Ok(LocationQuery::Coordinates(Coordinates { lat, lon }));
            }
        }
    }

    Ok(LocationQuery::Name(query.to_string()))
}

// --- OpenWeatherMap JSON response types ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCoord {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMain {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCondition {
    /// Primary condition group, e.g. "Clouds", "Rain".
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWind {
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSys {
    pub country: Option<String>,
}

/// `/weather` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCurrentConditions {
    pub coord: Option<RawCoord>,
    #[serde(default)]
    pub weather: Vec<RawCondition>,
    pub main: Option<RawMain>,
    pub visibility: Option<f64>,
    pub wind: Option<RawWind>,
    /// Observation time, epoch seconds.
    pub dt: Option<i64>,
    /// Offset from UTC of the location, seconds.
    pub timezone: Option<i32>,
    pub sys: Option<RawSys>,
    pub name: Option<String>,
}

impl RawCurrentConditions {
    /// Coordinates reported by the provider, if both parts are present.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let coord = self.coord.as_ref()?;
        Some(Coordinates {
            lat: coord.lat?,
            lon: coord.lon?,
        })
    }
}

/// One 3-hour slot of the `/forecast` payload, unvalidated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawForecastItem {
    pub dt: Option<i64>,
    pub main: Option<RawMain>,
    #[serde(default)]
    pub weather: Vec<RawCondition>,
    pub wind: Option<RawWind>,
    pub visibility: Option<f64>,
}

/// `/forecast` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawForecast {
    #[serde(default)]
    pub list: Vec<RawForecastItem>,
}

/// Everything the provider returned for one resolved location.
#[derive(Debug, Clone)]
pub struct ProviderSnapshot {
    pub coordinates: Coordinates,
    pub current: RawCurrentConditions,
    pub forecast: RawForecast,
}

/// Client for the OpenWeatherMap 2.5 API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Resolve a query and fetch both payloads.
    ///
    /// - coordinates: current and forecast are fetched in parallel
    /// - name: current first (it yields the coordinates), then the forecast
    pub async fn fetch(&self, query: &LocationQuery) -> Result<ProviderSnapshot, AppError> {
        match query {
            LocationQuery::Coordinates(coordinates) => {
                let (current, forecast) = futures::try_join!(
                    self.current_by_coordinates(*coordinates),
                    self.forecast(*coordinates)
                )?;
                Ok(ProviderSnapshot {
                    coordinates: *coordinates,
                    current,
                    forecast,
                })
            }
            LocationQuery::Name(name) => {
                let current = self.current_by_name(name).await?;
                let coordinates = current
                    .coordinates()
                    .ok_or(AppError::CoordinatesUnavailable)?;
                let forecast = self.forecast(coordinates).await?;
                Ok(ProviderSnapshot {
                    coordinates,
                    current,
                    forecast,
                })
            }
        }
    }

    pub async fn current_by_name(&self, name: &str) -> Result<RawCurrentConditions, AppError> {
        tracing::debug!("OpenWeather current conditions for '{}'", name);
        self.get_json("weather", &[("q", name.to_string())])
            .await
            .map_err(|e| e.into_location_error())
    }

    pub async fn current_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<RawCurrentConditions, AppError> {
        tracing::debug!(
            "OpenWeather current conditions for {},{}",
            coordinates.lat,
            coordinates.lon
        );
        self.get_json("weather", &coordinate_params(coordinates))
            .await
            .map_err(|e| e.into_location_error())
    }

    pub async fn forecast(&self, coordinates: Coordinates) -> Result<RawForecast, AppError> {
        tracing::debug!(
            "OpenWeather forecast for {},{}",
            coordinates.lat,
            coordinates.lon
        );
        self.get_json("forecast", &coordinate_params(coordinates))
            .await
            .map_err(|e| AppError::ForecastUnavailable(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, RequestFailure> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(RequestFailure::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestFailure::Status {
                status,
                body: truncate_body(&body),
            });
        }

        response.json::<T>().await.map_err(RequestFailure::Transport)
    }
}

fn coordinate_params(coordinates: Coordinates) -> [(&'static str, String); 2] {
    [
        ("lat", coordinates.lat.to_string()),
        ("lon", coordinates.lon.to_string()),
    ]
}

/// Why a single provider request failed, before it is mapped to a call-site error.
#[derive(Debug)]
enum RequestFailure {
    Status { status: StatusCode, body: String },
    Transport(reqwest::Error),
}

impl RequestFailure {
    /// Map a failed current-conditions call. Provider statuses are propagated;
    /// unreachable providers become 504 (timeout) or 502.
    fn into_location_error(self) -> AppError {
        let status = match &self {
            RequestFailure::Status { status, .. } => *status,
            RequestFailure::Transport(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            RequestFailure::Transport(_) => StatusCode::BAD_GATEWAY,
        };
        AppError::LocationNotFound {
            status,
            detail: self.to_string(),
        }
    }
}

impl std::fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestFailure::Status { status, body } => {
                write!(f, "OpenWeather returned HTTP {}: {}", status, body)
            }
            RequestFailure::Transport(e) if e.is_timeout() => {
                write!(f, "OpenWeather request timed out: {}", e)
            }
            RequestFailure::Transport(e) => write!(f, "OpenWeather request failed: {}", e),
        }
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn current_json(name: &str, lat: f64, lon: f64) -> serde_json::Value {
        serde_json::json!({
            "coord": { "lat": lat, "lon": lon },
            "weather": [{ "main": "Clouds", "description": "broken clouds", "icon": "04d" }],
            "main": { "temp": 285.0, "feels_like": 284.2, "pressure": 1013, "humidity": 71 },
            "visibility": 10000,
            "wind": { "speed": 3.2 },
            "dt": 1772366400,
            "timezone": 3600,
            "sys": { "country": "FR" },
            "name": name,
            "cod": 200
        })
    }

    fn forecast_json() -> serde_json::Value {
        serde_json::json!({
            "cod": "200",
            "list": [
                {
                    "dt": 1772366400,
                    "main": { "temp": 280.0, "pressure": 1012, "humidity": 80 },
                    "weather": [{ "main": "Rain", "icon": "10d" }],
                    "wind": { "speed": 2.0 }
                }
            ]
        })
    }

    fn client_for(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::new(&server.uri(), "test-key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_parse_query_coordinates() {
        assert_eq!(
            parse_location_query("48.8566,2.3522").unwrap(),
            LocationQuery::Coordinates(Coordinates {
                lat: 48.8566,
                lon: 2.3522
            })
        );
        assert_eq!(
            parse_location_query("-33.87, 151.21").unwrap(),
            LocationQuery::Coordinates(Coordinates {
                lat: -33.87,
                lon: 151.21
            })
        );
    }

    #[test]
    fn test_parse_query_names() {
        assert_eq!(
            parse_location_query("Paris").unwrap(),
            LocationQuery::Name("Paris".to_string())
        );
        assert_eq!(
            parse_location_query("Paris,France").unwrap(),
            LocationQuery::Name("Paris,France".to_string())
        );
        assert_eq!(
            parse_location_query("  New York  ").unwrap(),
            LocationQuery::Name("New York".to_string())
        );
        // Only one part numeric
        assert!(matches!(
            parse_location_query("48.85,east").unwrap(),
            LocationQuery::Name(_)
        ));
    }

    #[test]
    fn test_parse_query_out_of_range_still_coordinates() {
        // Ranges are not validated: "200,200" is passed through as coordinates.
        assert_eq!(
            parse_location_query("200,200").unwrap(),
            LocationQuery::Coordinates(Coordinates {
                lat: 200.0,
                lon: 200.0
            })
        );
    }

    #[test]
    fn test_parse_query_empty() {
        assert!(matches!(
            parse_location_query(""),
            Err(AppError::MissingQuery)
        ));
        assert!(matches!(
            parse_location_query("   "),
            Err(AppError::MissingQuery)
        ));
    }

    #[test]
    fn test_raw_current_coordinates() {
        let raw: RawCurrentConditions =
            serde_json::from_value(current_json("Paris", 48.85, 2.35)).unwrap();
        assert_eq!(
            raw.coordinates(),
            Some(Coordinates {
                lat: 48.85,
                lon: 2.35
            })
        );

        let missing_lon: RawCurrentConditions =
            serde_json::from_value(serde_json::json!({ "coord": { "lat": 1.0 } })).unwrap();
        assert_eq!(missing_lon.coordinates(), None);
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short"), "short");
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), MAX_ERROR_BODY_LEN + 3);
        assert!(truncated.ends_with("..."));
    }

    #[tokio::test]
    async fn test_fetch_by_name_resolves_coordinates_then_forecast() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Paris"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_json("Paris", 48.85, 2.35)))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("lat", "48.85"))
            .and(query_param("lon", "2.35"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json()))
            .expect(1)
            .mount(&server)
            .await;

        let snapshot = client_for(&server)
            .fetch(&LocationQuery::Name("Paris".to_string()))
            .await
            .unwrap();

        assert_eq!(snapshot.coordinates, Coordinates { lat: 48.85, lon: 2.35 });
        assert_eq!(snapshot.current.name.as_deref(), Some("Paris"));
        assert_eq!(snapshot.forecast.list.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_by_coordinates_skips_name_lookup() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("lat", "48.8566"))
            .and(query_param("lon", "2.3522"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_json("Paris", 48.86, 2.35)))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json()))
            .expect(1)
            .mount(&server)
            .await;

        let query = parse_location_query("48.8566,2.3522").unwrap();
        let snapshot = client_for(&server).fetch(&query).await.unwrap();

        // The queried coordinates win over the ones echoed by the provider
        assert_eq!(
            snapshot.coordinates,
            Coordinates {
                lat: 48.8566,
                lon: 2.3522
            }
        );
    }

    #[tokio::test]
    async fn test_name_lookup_failure_propagates_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch(&LocationQuery::Name("Atlantis".to_string()))
            .await
            .unwrap_err();

        match err {
            AppError::LocationNotFound { status, detail } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert!(detail.contains("city not found"));
            }
            other => panic!("expected LocationNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_coordinates_after_lookup() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Nowhere",
                "coord": { "lat": 10.0 }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch(&LocationQuery::Name("Nowhere".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::CoordinatesUnavailable));
    }

    #[tokio::test]
    async fn test_forecast_failure_is_forecast_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_json("Paris", 48.85, 2.35)))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch(&LocationQuery::Name("Paris".to_string()))
            .await
            .unwrap_err();

        match err {
            AppError::ForecastUnavailable(msg) => {
                assert!(msg.contains("503"), "message was: {}", msg);
                assert!(msg.contains("maintenance"));
            }
            other => panic!("expected ForecastUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_gateway_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(current_json("Paris", 48.85, 2.35))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client =
            OpenWeatherClient::new(&server.uri(), "test-key", Duration::from_millis(50)).unwrap();
        let err = client.current_by_name("Paris").await.unwrap_err();

        match err {
            AppError::LocationNotFound { status, .. } => {
                assert_eq!(status, StatusCode::GATEWAY_TIMEOUT)
            }
            other => panic!("expected LocationNotFound, got {:?}", other),
        }
    }
}
