//! Displayed dashboard result.
//!
//! Searches can overlap. Each one takes a ticket from a monotonically
//! increasing sequence when it starts, and its result is only committed if no
//! newer search has started since. A slow response for an old query can
//! therefore never replace the result of a newer one.
//!
//! Background refreshes re-run the displayed query without taking a ticket and
//! are dropped as soon as any search starts after them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::services::aggregator::{CurrentConditions, DailyAggregate, WeatherBundle};
use crate::services::openweather::OpenWeatherClient;
use crate::services::preferences::UserSettings;
use crate::services::weather::resolve_weather;

/// Handed out when a search starts; redeemed on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

impl SearchTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// The result currently shown on the dashboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisplayedResult {
    /// Query that produced this result, as the user typed it
    pub query: String,
    /// Sequence number of the search that produced it
    pub sequence: u64,
    pub updated_at: DateTime<Utc>,
    pub weather: WeatherBundle,
}

#[derive(Debug, Default)]
pub struct Dashboard {
    latest_sequence: AtomicU64,
    displayed: RwLock<Option<DisplayedResult>>,
}

pub type SharedDashboard = Arc<Dashboard>;

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a search. Invalidates every ticket issued before it.
    pub fn begin(&self) -> SearchTicket {
        SearchTicket(self.latest_sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: SearchTicket) -> bool {
        self.latest_sequence.load(Ordering::SeqCst) == ticket.0
    }

    /// Replace the displayed result if `ticket` is still the newest search.
    /// Returns whether the result was committed.
    pub async fn commit(
        &self,
        ticket: SearchTicket,
        query: &str,
        weather: WeatherBundle,
        now: DateTime<Utc>,
    ) -> bool {
        // Hold the write lock across the check so a concurrent commit of a
        // newer ticket cannot be overwritten.
        let mut displayed = self.displayed.write().await;
        if !self.is_latest(ticket) {
            tracing::warn!(
                "Discarding stale result for '{}' (search #{}, latest #{})",
                query,
                ticket.0,
                self.latest_sequence.load(Ordering::SeqCst)
            );
            return false;
        }
        *displayed = Some(DisplayedResult {
            query: query.to_string(),
            sequence: ticket.0,
            updated_at: now,
            weather,
        });
        true
    }

    /// What a background refresh should re-run: the displayed query and the
    /// newest ticket issued so far.
    pub async fn refresh_target(&self) -> Option<(String, u64)> {
        let displayed = self.displayed.read().await;
        let query = displayed.as_ref()?.query.clone();
        Some((query, self.latest_sequence.load(Ordering::SeqCst)))
    }

    /// Replace the displayed weather with a refreshed copy of the same query.
    ///
    /// Refreshes never take a ticket, so they cannot invalidate a user search
    /// in flight. The commit is rejected if any search started after
    /// `observed_sequence` was read or if the displayed query changed.
    pub async fn commit_refresh(
        &self,
        observed_sequence: u64,
        query: &str,
        weather: WeatherBundle,
        now: DateTime<Utc>,
    ) -> bool {
        let mut displayed = self.displayed.write().await;
        let latest = self.latest_sequence.load(Ordering::SeqCst);
        match displayed.as_mut() {
            Some(current) if latest == observed_sequence && current.query == query => {
                current.weather = weather;
                current.updated_at = now;
                true
            }
            _ => {
                tracing::debug!(
                    "Discarding refresh of '{}' (observed #{}, latest #{})",
                    query,
                    observed_sequence,
                    latest
                );
                false
            }
        }
    }

    pub async fn current(&self) -> Option<DisplayedResult> {
        self.displayed.read().await.clone()
    }
}

/// Result of a dashboard search.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchOutcome {
    pub sequence: u64,
    /// False when a newer search started while this one was in flight
    pub committed: bool,
    pub weather: WeatherBundle,
}

/// Resolve `query` and try to commit it to the dashboard.
///
/// Errors leave the displayed result untouched.
pub async fn search(
    client: &OpenWeatherClient,
    dashboard: &Dashboard,
    query: &str,
) -> Result<SearchOutcome, AppError> {
    let ticket = dashboard.begin();
    let weather = resolve_weather(client, query, Utc::now()).await?;
    let committed = dashboard
        .commit(ticket, query.trim(), weather.clone(), Utc::now())
        .await;
    Ok(SearchOutcome {
        sequence: ticket.sequence(),
        committed,
        weather,
    })
}

// ---------------------------------------------------------------------------
// Display rendering
// ---------------------------------------------------------------------------

/// Headline values converted to the user's preferred units.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConditions {
    pub temperature: Option<i32>,
    /// Omitted when the user hides feels-like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<i32>,
    pub temperature_unit: String,
    pub wind_speed: Option<i32>,
    pub wind_unit: String,
    pub pressure: Option<f64>,
    pub pressure_unit: String,
    /// Kilometres, not converted
    pub visibility: Option<i32>,
    /// Daily highs and lows in the chosen unit, empty when daily is hidden
    pub daily: Vec<DisplayDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisplayDay {
    pub date: String,
    pub max_temp: Option<i32>,
    pub min_temp: Option<i32>,
}

pub fn render_display(
    current: &CurrentConditions,
    daily: &[DailyAggregate],
    settings: &UserSettings,
) -> DisplayConditions {
    let temp = settings.temperature_unit;
    let feels_like = if settings.show_feels_like {
        current.feels_like.map(|c| temp.display(c))
    } else {
        None
    };
    let daily = if settings.show_daily {
        daily
            .iter()
            .map(|d| DisplayDay {
                date: d.date.clone(),
                max_temp: d.max_temp.map(|c| temp.display(c)),
                min_temp: d.min_temp.map(|c| temp.display(c)),
            })
            .collect()
    } else {
        Vec::new()
    };

    DisplayConditions {
        temperature: current.temperature.map(|c| temp.display(c)),
        feels_like,
        temperature_unit: temp.symbol().to_string(),
        wind_speed: current.wind_speed.map(|v| settings.wind_unit.display(v)),
        wind_unit: settings.wind_unit.symbol().to_string(),
        pressure: current.pressure.map(|v| settings.pressure_unit.display(v)),
        pressure_unit: settings.pressure_unit.symbol().to_string(),
        visibility: current.visibility,
        daily,
    }
}
