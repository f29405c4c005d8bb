//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `dobby.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use dobby_adapter_mqtt::{MqttConfig, parse_broker_url};
use dobby_app::EngineConfig;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Device bus settings.
    pub mqtt: MqttConfig,
    /// Automation engine timings.
    pub engine: EngineSettings,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Engine timing windows, in milliseconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Quiet period used to coalesce device state bursts.
    pub debounce_ms: u64,
    /// Cool-down during which an automation that just fired is ignored.
    pub suppression_ms: u64,
}

impl Config {
    /// Load configuration from `dobby.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("dobby.toml")?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(port) = var("PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("DOBBY_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("DOBBY_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("DOBBY_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("DOBBY_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("DOBBY_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("MQTT_BROKER_URL") {
            match parse_broker_url(&val) {
                Some((host, port)) => {
                    self.mqtt.enabled = true;
                    self.mqtt.broker_host = host;
                    self.mqtt.broker_port = port;
                }
                None => tracing::warn!(url = %val, "ignoring unparseable MQTT_BROKER_URL"),
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.engine.debounce_ms == 0 || self.engine.suppression_ms == 0 {
            return Err(ConfigError::Validation(
                "engine windows must be non-zero".to_string(),
            ));
        }
        if self.mqtt.enabled && self.mqtt.keep_alive_secs < 5 {
            return Err(ConfigError::Validation(
                "mqtt keep_alive_secs must be at least 5".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Engine timings as durations.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            debounce_window: Duration::from_millis(self.engine.debounce_ms),
            suppression_window: Duration::from_millis(self.engine.suppression_ms),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:dobby.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "dobby=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            suppression_ms: 2000,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
