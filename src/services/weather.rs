//! Query → provider → aggregator.
//!
//! The one path every caller (HTTP handler, dashboard search, refresher,
//! diagnostic CLI) takes to turn a location query into a `WeatherBundle`.

use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::services::aggregator::{aggregate, WeatherBundle};
use crate::services::openweather::{parse_location_query, OpenWeatherClient};

/// Resolve `raw_query` (a name or `"lat,lon"`) into a normalized bundle.
///
/// `now` is only used when the provider omits the observation time.
pub async fn resolve_weather(
    client: &OpenWeatherClient,
    raw_query: &str,
    now: DateTime<Utc>,
) -> Result<WeatherBundle, AppError> {
    let query = parse_location_query(raw_query)?;
    let snapshot = client.fetch(&query).await?;
    aggregate(&snapshot, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn forecast_entries(start: i64, n: i64) -> Vec<serde_json::Value> {
        (0..n)
            .map(|i| {
                serde_json::json!({
                    "dt": start + i * 10800,
                    "main": { "temp": 280.0, "feels_like": 278.0, "pressure": 1010, "humidity": 80 },
                    "weather": [{ "main": "Rain", "description": "light rain", "icon": "10d" }],
                    "wind": { "speed": 5.0 },
                    "visibility": 8000
                })
            })
            .collect()
    }

    async fn mock_provider(server: &MockServer, entries: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "coord": { "lat": 59.33, "lon": 18.07 },
                "weather": [{ "main": "Snow", "icon": "13d" }],
                "main": { "temp": 270.15, "feels_like": 265.15, "pressure": 1002, "humidity": 90 },
                "wind": { "speed": 6.0 },
                "dt": 1772366400,
                "timezone": 3600,
                "sys": { "country": "SE" },
                "name": "Stockholm"
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("lat", "59.33"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "cod": "200", "list": entries })),
            )
            .mount(server)
            .await;
    }

    fn client_for(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::new(&server.uri(), "key", Duration::from_secs(5)).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_weather_full_forecast() {
        let server = MockServer::start().await;
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap().timestamp();
        mock_provider(&server, forecast_entries(start, 40)).await;

        let bundle = resolve_weather(&client_for(&server), "Stockholm", now())
            .await
            .unwrap();

        assert_eq!(bundle.current.location, "Stockholm");
        assert_eq!(bundle.current.country, "SE");
        assert_eq!(bundle.current.temperature, Some(-3));
        assert_eq!(bundle.current.feels_like, Some(-8));
        assert_eq!(bundle.current.wind_speed, Some(22)); // 21.6
        // Visibility missing from the current payload
        assert_eq!(bundle.current.visibility, None);
        assert_eq!(bundle.hourly.len(), 24);
        assert_eq!(bundle.daily.len(), 5);
        assert_eq!(bundle.daily[0].wind_speed, Some(18));
    }

    #[tokio::test]
    async fn test_resolve_weather_empty_forecast() {
        let server = MockServer::start().await;
        mock_provider(&server, vec![]).await;

        let bundle = resolve_weather(&client_for(&server), "Stockholm", now())
            .await
            .unwrap();

        assert!(bundle.hourly.is_empty());
        assert!(bundle.daily.is_empty());
        assert_eq!(bundle.current.location, "Stockholm");
    }

    #[tokio::test]
    async fn test_resolve_weather_rejects_blank_query_without_calling_provider() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = resolve_weather(&client_for(&server), "  ", now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingQuery));
    }

    #[tokio::test]
    async fn test_resolve_weather_malformed_entry() {
        let server = MockServer::start().await;
        mock_provider(
            &server,
            vec![serde_json::json!({ "main": { "temp": 280.0 } })],
        )
        .await;

        let err = resolve_weather(&client_for(&server), "Stockholm", now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AggregationError(_)));
    }
}
