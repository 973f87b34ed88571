//! Chat client configuration
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub endpoints: EndpointConfig,
    pub timeouts: TimeoutConfig,
    pub sync: SyncConfig,
    pub reconnect: ReconnectSettings,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Where the chat backend lives
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// REST base URL, without trailing slash
    pub api_url: String,
    /// WebSocket base URL, without trailing slash
    pub gateway_url: String,
    /// Push namespace, kept apart from general application traffic
    pub namespace: String,
}

impl EndpointConfig {
    /// Full URL of the push namespace endpoint
    #[must_use]
    pub fn namespace_url(&self) -> String {
        format!("{}/{}", self.gateway_url, self.namespace)
    }
}

/// Bounded waits for network calls
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// History, mark-read, room list and room creation calls
    pub request: Duration,
    /// Transport connect plus identify handshake
    pub connect: Duration,
}

/// Synchronization behavior
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Page size of a history fetch
    pub history_limit: u32,
    /// A reconnect after a longer gap re-hydrates the active room
    pub rehydrate_after: Duration,
    /// Capacity of the engine and connection channels
    pub event_buffer: usize,
}

/// Transport reconnect policy
#[derive(Debug, Clone, Copy)]
pub struct ReconnectSettings {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Zero means retry forever
    pub max_attempts: u32,
}

// Default value functions
fn default_app_name() -> String {
    "chat-sync".to_string()
}

fn default_namespace() -> String {
    "chat".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_history_limit() -> u32 {
    50
}

fn default_rehydrate_after_secs() -> u64 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    30_000
}

fn default_event_buffer() -> usize {
    256
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(value) => Environment::parse(&value)
                .ok_or(ConfigError::InvalidValue("APP_ENV", value))?,
            None => Environment::default(),
        };

        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            endpoints: EndpointConfig {
                api_url: required_url(&lookup, "CHAT_API_URL")?,
                gateway_url: required_url(&lookup, "CHAT_GATEWAY_URL")?,
                namespace: lookup("CHAT_NAMESPACE")
                    .map(|ns| ns.trim_matches('/').to_string())
                    .filter(|ns| !ns.is_empty())
                    .unwrap_or_else(default_namespace),
            },
            timeouts: TimeoutConfig {
                request: Duration::from_secs(parse_or(
                    &lookup,
                    "CHAT_REQUEST_TIMEOUT_SECS",
                    default_request_timeout_secs,
                )?),
                connect: Duration::from_secs(parse_or(
                    &lookup,
                    "CHAT_CONNECT_TIMEOUT_SECS",
                    default_connect_timeout_secs,
                )?),
            },
            sync: SyncConfig {
                history_limit: parse_or(&lookup, "CHAT_HISTORY_LIMIT", default_history_limit)?,
                rehydrate_after: Duration::from_secs(parse_or(
                    &lookup,
                    "CHAT_REHYDRATE_AFTER_SECS",
                    default_rehydrate_after_secs,
                )?),
                event_buffer: parse_or(&lookup, "CHAT_EVENT_BUFFER", default_event_buffer)?,
            },
            reconnect: ReconnectSettings {
                initial_delay: Duration::from_millis(parse_or(
                    &lookup,
                    "CHAT_RECONNECT_DELAY_MS",
                    default_reconnect_delay_ms,
                )?),
                max_delay: Duration::from_millis(parse_or(
                    &lookup,
                    "CHAT_RECONNECT_MAX_DELAY_MS",
                    default_reconnect_max_delay_ms,
                )?),
                max_attempts: parse_or(&lookup, "CHAT_RECONNECT_MAX_ATTEMPTS", || 0)?,
            },
        };

        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.sync.history_limit == 0 {
            return Err(ConfigError::InvalidValue("CHAT_HISTORY_LIMIT", "0".into()));
        }
        if self.sync.event_buffer == 0 {
            return Err(ConfigError::InvalidValue("CHAT_EVENT_BUFFER", "0".into()));
        }
        if self.timeouts.request.is_zero() {
            return Err(ConfigError::InvalidValue(
                "CHAT_REQUEST_TIMEOUT_SECS",
                "0".into(),
            ));
        }
        if self.timeouts.connect.is_zero() {
            return Err(ConfigError::InvalidValue(
                "CHAT_CONNECT_TIMEOUT_SECS",
                "0".into(),
            ));
        }
        Ok(())
    }
}

fn required_url<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or(ConfigError::MissingVar(key))?;
    let trimmed = value.trim().trim_end_matches('/');
    if !trimmed.contains("://") {
        return Err(ConfigError::InvalidValue(key, value));
    }
    Ok(trimmed.to_string())
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
