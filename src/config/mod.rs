//! Configuration module for the project management client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Output format for the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Raised when an environment variable holds a value that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for {}: {:?}", self.variable, self.value)
    }
}

impl std::error::Error for ConfigError {}

/// Login credentials supplied through the environment.
#[derive(Clone)]
pub struct EnvCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for EnvCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL of the REST API, without trailing slash
    pub api_base_url: String,
    /// WebSocket endpoint of the notification hub
    pub push_url: String,
    /// Path to the SQLite file backing local storage
    pub storage_path: PathBuf,
    /// Delay between push reconnect attempts
    pub push_reconnect_delay: Duration,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Used by the binary when no stored session can be restored
    pub credentials: Option<EnvCredentials>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("PM_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5179/api".to_string())
            .trim_end_matches('/')
            .to_string();

        let push_url = env::var("PM_PUSH_URL")
            .unwrap_or_else(|_| "ws://localhost:5179/hubs/notification".to_string());

        let storage_path = env::var("PM_STORAGE_PATH")
            .unwrap_or_else(|_| "./data/client.sqlite".to_string())
            .into();

        let push_reconnect_delay = match env::var("PM_PUSH_RECONNECT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError {
                    variable: "PM_PUSH_RECONNECT_SECS",
                    value: raw,
                })?,
            Err(_) => Duration::from_secs(5),
        };

        let log_level = env::var("PM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("PM_LOG_FORMAT") {
            Ok(raw) => LogFormat::from_str(&raw).ok_or(ConfigError {
                variable: "PM_LOG_FORMAT",
                value: raw,
            })?,
            Err(_) => LogFormat::Pretty,
        };

        let credentials = match (env::var("PM_USERNAME"), env::var("PM_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.trim().is_empty() => {
                Some(EnvCredentials { username, password })
            }
            _ => None,
        };

        Ok(Self {
            api_base_url,
            push_url,
            storage_path,
            push_reconnect_delay,
            log_level,
            log_format,
            credentials,
        })
    }

    /// Configuration pointing at a given backend, used by embedders and tests.
    pub fn for_backend(api_base_url: &str, push_url: &str, storage_path: PathBuf) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            push_url: push_url.to_string(),
            storage_path,
            push_reconnect_delay: Duration::from_secs(5),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            credentials: None,
        }
    }
}
