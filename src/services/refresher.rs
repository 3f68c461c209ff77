//! Background auto-refresh of the displayed result.
//!
//! Re-runs the dashboard's current query every `refreshIntervalMinutes`. The
//! interval comes from a `watch` channel fed by the settings endpoint; any
//! change restarts the wait so a new interval applies at once. An interval of
//! 0 parks the task until settings change again.
//!
//! Refreshes never take a search ticket: a user search that is in flight, or
//! that starts while a refresh is running, always wins. Refreshes are not
//! recorded in search history.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::services::dashboard::{Dashboard, SharedDashboard};
use crate::services::openweather::OpenWeatherClient;
use crate::services::preferences::UserSettings;
use crate::services::weather::resolve_weather;

pub fn refresh_interval(settings: &UserSettings) -> Option<Duration> {
    match settings.refresh_interval_minutes {
        0 => None,
        minutes => Some(Duration::from_secs(u64::from(minutes) * 60)),
    }
}

/// Run the refresher until the settings channel closes.
pub async fn run_refresher(
    client: OpenWeatherClient,
    dashboard: SharedDashboard,
    settings_rx: watch::Receiver<UserSettings>,
) {
    tracing::info!("Background refresher started");
    let client = &client;
    let dashboard: &Dashboard = &dashboard;
    refresh_loop(settings_rx, move || refresh_once(client, dashboard)).await;
    tracing::info!("Background refresher stopped");
}

/// Call `tick` every refresh interval. A settings change restarts the wait.
async fn refresh_loop<F, Fut>(mut settings_rx: watch::Receiver<UserSettings>, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: Future,
{
    loop {
        let interval = refresh_interval(&settings_rx.borrow_and_update());

        let Some(interval) = interval else {
            tracing::debug!("Refresher: auto-refresh off, waiting for settings change");
            if settings_rx.changed().await.is_err() {
                break;
            }
            continue;
        };

        tracing::debug!("Refresher: next refresh in {}s", interval.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                tick().await;
            }
            changed = settings_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                tracing::debug!("Refresher: settings changed, restarting wait");
            }
        }
    }
}

/// Re-run the displayed query once. Returns whether the refreshed weather was
/// committed.
pub async fn refresh_once(client: &OpenWeatherClient, dashboard: &Dashboard) -> bool {
    let Some((query, observed_sequence)) = dashboard.refresh_target().await else {
        tracing::debug!("Refresher: nothing displayed yet, skipping");
        return false;
    };

    match resolve_weather(client, &query, Utc::now()).await {
        Ok(weather) => {
            let committed = dashboard
                .commit_refresh(observed_sequence, &query, weather, Utc::now())
                .await;
            if committed {
                tracing::info!("Refresher: refreshed '{}'", query);
            }
            committed
        }
        Err(e) => {
            tracing::warn!("Refresher: refresh of '{}' failed: {}", query, e);
            false
        }
    }
}
