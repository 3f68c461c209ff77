/// Key used when running in development mode without `OPENWEATHER_API_KEY`.
///
/// For local demos only. Production startup refuses to fall back to it.
pub const DEVELOPMENT_API_KEY: &str = "development-demo-key";

const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Production,
    Development,
}

impl AppMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppMode::Production => "production",
            AppMode::Development => "development",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON lines; anything else is human-readable.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("OPENWEATHER_API_KEY must be set in production mode (set APP_MODE=development to use the demo key)")]
    MissingApiKey,

    #[error("Unknown APP_MODE '{0}' (expected 'production' or 'development')")]
    UnknownMode(String),

    #[error("{name} must be {expected}, got '{value}'")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: AppMode,
    pub api_key: String,
    /// Root of the OpenWeatherMap 2.5 API (overridable for tests and proxies).
    pub provider_base_url: String,
    pub provider_timeout_secs: u64,
    pub port: u16,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("APP_MODE").as_deref().map(str::trim) {
            None | Some("") | Some("production") => AppMode::Production,
            Some("development") => AppMode::Development,
            Some(other) => return Err(ConfigError::UnknownMode(other.to_string())),
        };

        let api_key = match lookup("OPENWEATHER_API_KEY").filter(|k| !k.trim().is_empty()) {
            Some(key) => key,
            None if mode == AppMode::Development => {
                tracing::warn!("OPENWEATHER_API_KEY not set, using the development demo key");
                DEVELOPMENT_API_KEY.to_string()
            }
            None => return Err(ConfigError::MissingApiKey),
        };

        let provider_timeout_secs = match lookup("PROVIDER_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "PROVIDER_TIMEOUT_SECS",
                    expected: "a positive number of seconds",
                    value: v,
                })?,
            None => DEFAULT_PROVIDER_TIMEOUT_SECS,
        };

        let port = match lookup("PORT") {
            Some(v) => v.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                expected: "a valid u16",
                value: v,
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = LogFormat::parse(lookup("LOG_FORMAT").as_deref());

        Ok(Self {
            mode,
            api_key,
            provider_base_url: lookup("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string()),
            provider_timeout_secs,
            port,
            log_format,
        })
    }
}
