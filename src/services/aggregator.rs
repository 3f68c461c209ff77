//! Forecast normalization and aggregation.
//!
//! Turns one provider snapshot (raw current conditions + raw 3-hour forecast
//! entries) into the shapes the dashboard renders:
//!
//! - `HourlyPoint`: the first 24 forecast entries, converted. No resampling;
//!   "hourly" is the display cadence, the spacing stays 3 hours.
//! - `DailyAggregate`: entries grouped by UTC calendar date, first 7 dates in
//!   first-seen order, reduced to max/min temperature, the first entry's
//!   condition and icon, and mean humidity / wind.
//! - `CurrentConditions`: the current snapshot, converted, with the resolved
//!   coordinates attached.
//!
//! Everything here is pure. The only clock input is `now`, used as the
//! observation time when the provider omitted one.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::services::openweather::{
    Coordinates, ProviderSnapshot, RawCondition, RawCurrentConditions, RawForecastItem,
};
use crate::units::{
    kelvin_to_celsius, meters_per_second_to_kmh, meters_to_km, plausible_reading, round_half_up,
};

/// Maximum points in the hourly series.
pub const HOURLY_POINTS: usize = 24;
/// Maximum days in the daily series.
pub const DAILY_POINTS: usize = 7;

/// A forecast entry that passed validation. Absent readings stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub temperature_k: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub condition: Option<String>,
    pub icon: Option<String>,
    pub visibility_m: Option<f64>,
}

/// Normalized current conditions.
///
/// Numeric readings are `null` when the provider omitted them, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    /// Location name as reported by the provider
    pub location: String,
    /// ISO 3166 country code
    pub country: String,
    /// Temperature in °C
    pub temperature: Option<i32>,
    /// Feels-like temperature in °C
    pub feels_like: Option<i32>,
    /// Primary condition label (e.g. "Clouds")
    pub condition: Option<String>,
    /// Provider icon code (e.g. "04d")
    pub icon: Option<String>,
    /// Relative humidity in %
    pub humidity: Option<i32>,
    /// Wind speed in km/h
    pub wind_speed: Option<i32>,
    /// Pressure in hPa
    pub pressure: Option<i32>,
    /// Visibility in km, `null` when the provider did not report it
    pub visibility: Option<i32>,
    /// Observation time in the location's UTC offset (ISO 8601)
    pub local_time: String,
    pub coordinates: Coordinates,
}

/// One point of the hourly series.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPoint {
    /// Slot time (ISO 8601, UTC)
    pub timestamp: String,
    /// Temperature in °C
    pub temperature: Option<i32>,
    /// Relative humidity in %
    pub humidity: Option<i32>,
    /// Wind speed in km/h
    pub wind_speed: Option<i32>,
    /// Pressure in hPa
    pub pressure: Option<i32>,
}

/// Summary of one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyAggregate {
    /// UTC date, "YYYY-MM-DD"
    pub date: String,
    /// Highest temperature of the day's entries, °C
    pub max_temp: Option<i32>,
    /// Lowest temperature of the day's entries, °C
    pub min_temp: Option<i32>,
    /// Condition of the day's first entry
    pub condition: Option<String>,
    /// Icon of the day's first entry
    pub icon: Option<String>,
    /// Mean relative humidity in %
    pub humidity: Option<i32>,
    /// Mean wind speed in km/h
    pub wind_speed: Option<i32>,
}

/// The normalized bundle served by the weather endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeatherBundle {
    #[serde(flatten)]
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyAggregate>,
}

/// Converted values of one entry, as accumulated into its day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayEntry {
    pub temperature: Option<i32>,
    pub condition: Option<String>,
    pub icon: Option<String>,
    pub humidity: Option<i32>,
    pub wind_speed: Option<i32>,
}

/// All entries sharing one UTC date, in arrival order. Never empty: a bucket
/// is created by the entry that produced its key.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub entries: Vec<DayEntry>,
}

/// Normalize a full provider snapshot.
pub fn aggregate(snapshot: &ProviderSnapshot, now: DateTime<Utc>) -> Result<WeatherBundle, AppError> {
    let entries = validate_entries(&snapshot.forecast.list)?;
    let hourly = hourly_series(&entries);
    let daily = daily_series(&entries);
    let current = normalize_current(&snapshot.current, snapshot.coordinates, now);

    tracing::debug!(
        "Aggregated {} raw entries into {} hourly points and {} days for '{}'",
        entries.len(),
        hourly.len(),
        daily.len(),
        current.location
    );

    Ok(WeatherBundle {
        current,
        hourly,
        daily,
    })
}

/// Validate raw forecast items.
///
/// A missing or unrepresentable timestamp is an `AggregationError`, since the
/// entry can be neither placed in the series nor grouped. Missing readings are
/// kept as `None`.
pub fn validate_entries(items: &[RawForecastItem]) -> Result<Vec<ForecastEntry>, AppError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| -> Result<ForecastEntry, AppError> {
            let dt = item.dt.ok_or_else(|| {
                AppError::AggregationError(format!("forecast entry {} has no timestamp", index))
            })?;
            let timestamp = DateTime::<Utc>::from_timestamp(dt, 0).ok_or_else(|| {
                AppError::AggregationError(format!(
                    "forecast entry {} has an out-of-range timestamp {}",
                    index, dt
                ))
            })?;

            let main = item.main.clone().unwrap_or_default();
            if main.temp.is_none() {
                tracing::warn!("Forecast entry {} ({}) has no temperature", index, timestamp);
            }
            let (condition, icon) = primary_condition(&item.weather);

            Ok(ForecastEntry {
                timestamp,
                temperature_k: plausible_reading(main.temp),
                humidity_pct: plausible_reading(main.humidity),
                wind_speed_ms: plausible_reading(item.wind.as_ref().and_then(|w| w.speed)),
                pressure_hpa: plausible_reading(main.pressure),
                condition,
                icon,
                visibility_m: plausible_reading(item.visibility),
            })
        })
        .collect()
}

/// First `min(24, n)` entries, in provider order.
pub fn hourly_series(entries: &[ForecastEntry]) -> Vec<HourlyPoint> {
    entries
        .iter()
        .take(HOURLY_POINTS)
        .map(|e| HourlyPoint {
            timestamp: e.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            temperature: e.temperature_k.map(kelvin_to_celsius),
            humidity: e.humidity_pct.map(round_half_up),
            wind_speed: e.wind_speed_ms.map(meters_per_second_to_kmh),
            pressure: e.pressure_hpa.map(round_half_up),
        })
        .collect()
}

/// Group every entry by its UTC calendar date, buckets in first-seen order.
pub fn group_by_utc_date(entries: &[ForecastEntry]) -> Vec<DayBucket> {
    let mut buckets: Vec<DayBucket> = Vec::new();
    let mut index_by_date: HashMap<NaiveDate, usize> = HashMap::new();

    for e in entries {
        let date = e.timestamp.date_naive();
        let day_entry = DayEntry {
            temperature: e.temperature_k.map(kelvin_to_celsius),
            condition: e.condition.clone(),
            icon: e.icon.clone(),
            humidity: e.humidity_pct.map(round_half_up),
            wind_speed: e.wind_speed_ms.map(meters_per_second_to_kmh),
        };

        match index_by_date.get(&date) {
            Some(&i) => buckets[i].entries.push(day_entry),
            None => {
                index_by_date.insert(date, buckets.len());
                buckets.push(DayBucket {
                    date,
                    entries: vec![day_entry],
                });
            }
        }
    }

    buckets
}

/// Reduce the first 7 date buckets to daily summaries.
pub fn daily_series(entries: &[ForecastEntry]) -> Vec<DailyAggregate> {
    group_by_utc_date(entries)
        .iter()
        .take(DAILY_POINTS)
        .map(reduce_day)
        .collect()
}

fn reduce_day(bucket: &DayBucket) -> DailyAggregate {
    let temps = bucket.entries.iter().filter_map(|e| e.temperature);
    let first = bucket.entries.first();

    DailyAggregate {
        date: bucket.date.format("%Y-%m-%d").to_string(),
        max_temp: temps.clone().max(),
        min_temp: temps.min(),
        condition: first.and_then(|e| e.condition.clone()),
        icon: first.and_then(|e| e.icon.clone()),
        humidity: rounded_mean(bucket.entries.iter().filter_map(|e| e.humidity)),
        wind_speed: rounded_mean(bucket.entries.iter().filter_map(|e| e.wind_speed)),
    }
}

/// Arithmetic mean rounded once at the end; `None` when no value is present.
fn rounded_mean(values: impl Iterator<Item = i32>) -> Option<i32> {
    let (sum, count) = values.fold((0i64, 0u32), |(sum, count), v| (sum + i64::from(v), count + 1));
    if count == 0 {
        return None;
    }
    Some(round_half_up(sum as f64 / f64::from(count)))
}

/// Normalize the current snapshot and attach the resolved coordinates.
pub fn normalize_current(
    raw: &RawCurrentConditions,
    coordinates: Coordinates,
    now: DateTime<Utc>,
) -> CurrentConditions {
    let main = raw.main.clone().unwrap_or_default();
    let (condition, icon) = primary_condition(&raw.weather);

    CurrentConditions {
        location: raw.name.clone().unwrap_or_default(),
        country: raw
            .sys
            .as_ref()
            .and_then(|s| s.country.clone())
            .unwrap_or_default(),
        temperature: plausible_reading(main.temp).map(kelvin_to_celsius),
        feels_like: plausible_reading(main.feels_like).map(kelvin_to_celsius),
        condition,
        icon,
        humidity: plausible_reading(main.humidity).map(round_half_up),
        wind_speed: plausible_reading(raw.wind.as_ref().and_then(|w| w.speed)).map(meters_per_second_to_kmh),
        pressure: plausible_reading(main.pressure).map(round_half_up),
        visibility: meters_to_km(plausible_reading(raw.visibility)),
        local_time: local_observation_time(raw.dt, raw.timezone, now),
        coordinates,
    }
}

/// Observation time shifted to the location's offset. Falls back to `now`
/// when the provider gave no timestamp and to UTC when it gave no offset.
fn local_observation_time(dt: Option<i64>, offset_secs: Option<i32>, now: DateTime<Utc>) -> String {
    let observed = dt
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or(now);
    match offset_secs.and_then(FixedOffset::east_opt) {
        Some(offset) => observed
            .with_timezone(&offset)
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        None => observed.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

fn primary_condition(weather: &[RawCondition]) -> (Option<String>, Option<String>) {
    match weather.first() {
        Some(w) => (w.main.clone(), w.icon.clone()),
        None => (None, None),
    }
}
