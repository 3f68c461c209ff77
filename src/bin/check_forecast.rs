//! Resolve one location from the command line and print the normalized result.
//!
//! Uses the same configuration and code path as the HTTP API:
//!
//! ```text
//! OPENWEATHER_API_KEY=... check_forecast "Lisbon" --hours 8
//! check_forecast "38.72,-9.14" --dev
//! ```

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use weather_dashboard_api::config::AppConfig;
use weather_dashboard_api::services::aggregator::WeatherBundle;
use weather_dashboard_api::services::openweather::OpenWeatherClient;
use weather_dashboard_api::services::weather::resolve_weather;

#[derive(Debug, Parser)]
#[command(name = "check_forecast", version, about = "Fetch and print normalized weather for a location")]
struct Cli {
    /// City name or "lat,lon"
    query: String,

    /// Run in development mode (falls back to the demo API key)
    #[arg(long)]
    dev: bool,

    /// Number of hourly rows to print
    #[arg(long, default_value_t = 8)]
    hours: usize,

    /// Number of daily rows to print
    #[arg(long, default_value_t = 7)]
    days: usize,
}

fn show(value: Option<i32>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}{}", v, unit),
        None => "-".to_string(),
    }
}

fn print_bundle(bundle: &WeatherBundle, hours: usize, days: usize) {
    let c = &bundle.current;
    println!(
        "{}, {} ({:.2}, {:.2}) at {}",
        c.location, c.country, c.coordinates.lat, c.coordinates.lon, c.local_time
    );
    println!(
        "  {} {} (feels like {}), humidity {}, wind {}, pressure {}, visibility {}",
        c.condition.as_deref().unwrap_or("-"),
        show(c.temperature, "°C"),
        show(c.feels_like, "°C"),
        show(c.humidity, "%"),
        show(c.wind_speed, " km/h"),
        show(c.pressure, " hPa"),
        show(c.visibility, " km"),
    );

    println!("\nHourly ({} of {}):", hours.min(bundle.hourly.len()), bundle.hourly.len());
    for h in bundle.hourly.iter().take(hours) {
        println!(
            "  {}  {:>6}  {:>4}  {:>9}  {:>9}",
            h.timestamp,
            show(h.temperature, "°C"),
            show(h.humidity, "%"),
            show(h.wind_speed, " km/h"),
            show(h.pressure, " hPa"),
        );
    }

    println!("\nDaily ({} of {}):", days.min(bundle.daily.len()), bundle.daily.len());
    for d in bundle.daily.iter().take(days) {
        println!(
            "  {}  {:>6} / {:<6}  {:<12}  {:>4}  {:>9}",
            d.date,
            show(d.max_temp, "°C"),
            show(d.min_temp, "°C"),
            d.condition.as_deref().unwrap_or("-"),
            show(d.humidity, "%"),
            show(d.wind_speed, " km/h"),
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_dashboard_api=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_lookup(|name| match name {
        "APP_MODE" if cli.dev => Some("development".to_string()),
        _ => std::env::var(name).ok(),
    })
    .context("loading configuration")?;

    let client = OpenWeatherClient::new(
        &config.provider_base_url,
        &config.api_key,
        Duration::from_secs(config.provider_timeout_secs),
    )?;

    let bundle = resolve_weather(&client, &cli.query, Utc::now())
        .await
        .with_context(|| format!("resolving '{}'", cli.query))?;

    print_bundle(&bundle, cli.hours, cli.days);
    Ok(())
}
