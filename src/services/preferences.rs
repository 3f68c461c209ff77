//! Search history, favorites and user settings.
//!
//! All three are JSON blobs in the key-value store under fixed keys. A blob that
//! fails to parse is logged and treated as absent, so one corrupt entry does not
//! lock the user out of the dashboard.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::services::openweather::Coordinates;
use crate::services::storage::SharedStore;
use crate::units::{PressureUnit, TemperatureUnit, WindUnit};

pub const SETTINGS_KEY: &str = "weather-dashboard.settings";
pub const FAVORITES_KEY: &str = "weather-dashboard.favorites";
pub const HISTORY_KEY: &str = "weather-dashboard.search-history";

/// Number of searches kept in history.
pub const MAX_HISTORY: usize = 5;
/// Longest allowed refresh interval (one day).
pub const MAX_REFRESH_INTERVAL_MINUTES: u32 = 1440;
const MAX_LANGUAGE_LEN: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// User preferences. Units here affect rendering only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub temperature_unit: TemperatureUnit,
    pub wind_unit: WindUnit,
    pub pressure_unit: PressureUnit,
    /// UI language tag (e.g. "en", "pt-BR")
    pub language: String,
    pub theme: Theme,
    /// Auto-refresh interval in minutes, 0 disables it
    pub refresh_interval_minutes: u32,
    pub show_feels_like: bool,
    pub show_hourly: bool,
    pub show_daily: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::default(),
            wind_unit: WindUnit::default(),
            pressure_unit: PressureUnit::default(),
            language: "en".to_string(),
            theme: Theme::default(),
            refresh_interval_minutes: 0,
            show_feels_like: true,
            show_hourly: true,
            show_daily: true,
        }
    }
}

impl UserSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        let language = self.language.trim();
        if language.is_empty() || language.len() > MAX_LANGUAGE_LEN {
            return Err(AppError::BadRequest(format!(
                "language must be a non-empty tag of at most {} characters",
                MAX_LANGUAGE_LEN
            )));
        }
        if self.refresh_interval_minutes > MAX_REFRESH_INTERVAL_MINUTES {
            return Err(AppError::BadRequest(format!(
                "refreshIntervalMinutes must be between 0 and {}",
                MAX_REFRESH_INTERVAL_MINUTES
            )));
        }
        Ok(())
    }
}

/// A saved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    /// `"<name>-<country>"`
    pub id: String,
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub added_at: DateTime<Utc>,
}

/// Body of a favorite-add event.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewFavorite {
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
}

pub fn favorite_id(name: &str, country: &str) -> String {
    format!("{}-{}", name, country)
}

/// Typed access to the persisted dashboard state.
#[derive(Debug, Clone)]
pub struct Preferences {
    store: SharedStore,
    /// Serializes read-modify-write cycles on the list blobs.
    write_lock: Arc<Mutex<()>>,
}

impl Preferences {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn read<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.store.get(key) else {
            return T::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable '{}' blob: {}", key, e);
            T::default()
        })
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| AppError::InternalError(format!("Failed to serialize '{}': {}", key, e)))?;
        self.store.set(key, raw);
        Ok(())
    }

    // --- search history ---

    /// Most-recent-first, at most `MAX_HISTORY` entries.
    pub fn history(&self) -> Vec<String> {
        self.read(HISTORY_KEY)
    }

    /// Put `query` at the front of the history. An existing entry that matches
    /// case-insensitively is moved rather than duplicated. Blank queries are
    /// ignored.
    pub fn record_search(&self, query: &str) -> Result<Vec<String>, AppError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let query = query.trim();
        let mut history = self.history();
        if query.is_empty() {
            return Ok(history);
        }

        history.retain(|q| !q.eq_ignore_ascii_case(query));
        history.insert(0, query.to_string());
        history.truncate(MAX_HISTORY);

        self.write(HISTORY_KEY, &history)?;
        Ok(history)
    }

    pub fn clear_history(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.remove(HISTORY_KEY);
    }

    // --- favorites ---

    pub fn favorites(&self) -> Vec<Favorite> {
        self.read(FAVORITES_KEY)
    }

    /// Add a favorite. Adding an id that already exists returns the stored entry
    /// unchanged.
    pub fn add_favorite(&self, new: NewFavorite, now: DateTime<Utc>) -> Result<Favorite, AppError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Favorite name must not be empty".to_string()));
        }
        let country = new.country.trim();
        let id = favorite_id(name, country);

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut favorites = self.favorites();
        if let Some(existing) = favorites.iter().find(|f| f.id == id) {
            return Ok(existing.clone());
        }

        let favorite = Favorite {
            id,
            name: name.to_string(),
            country: country.to_string(),
            coordinates: new.coordinates,
            added_at: now,
        };
        favorites.push(favorite.clone());
        self.write(FAVORITES_KEY, &favorites)?;

        tracing::info!("Added favorite '{}'", favorite.id);
        Ok(favorite)
    }

    pub fn remove_favorite(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut favorites = self.favorites();
        let before = favorites.len();
        favorites.retain(|f| f.id != id);
        if favorites.len() == before {
            return Err(AppError::NotFound(format!("Favorite {} not found", id)));
        }
        self.write(FAVORITES_KEY, &favorites)
    }

    // --- settings ---

    pub fn settings(&self) -> UserSettings {
        self.read(SETTINGS_KEY)
    }

    pub fn update_settings(&self, settings: UserSettings) -> Result<UserSettings, AppError> {
        let settings = UserSettings {
            language: settings.language.trim().to_string(),
            ..settings
        };
        settings.validate()?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write(SETTINGS_KEY, &settings)?;
        Ok(settings)
    }
}
