//! Configuration loading from TOML files and environment variables.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stream: StreamConfig,
    pub logging: LoggingConfig,
}

/// Stream emission defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Default client reconnect interval (milliseconds).
    pub retry_ms: u32,

    /// Whether auto-generated IDs count events instead of using timestamps.
    pub counter_as_id: bool,

    /// Timeout for individual writes to the client (seconds).
    pub write_timeout_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            retry_ms: 10_000,
            counter_as_id: false,
            write_timeout_secs: 30,
        }
    }
}

impl StreamConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn").
    pub level: String,

    /// Output format: "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError(format!(
                "failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from file, then apply environment variable overrides.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SSE_RETRY_MS") {
            if let Ok(n) = v.parse() {
                self.stream.retry_ms = n;
            }
        }
        if let Ok(v) = std::env::var("SSE_COUNTER_AS_ID") {
            self.stream.counter_as_id = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("SSE_WRITE_TIMEOUT") {
            if let Ok(n) = v.parse() {
                self.stream.write_timeout_secs = n;
            }
        }
        if let Ok(v) = std::env::var("SSE_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("SSE_LOG_FORMAT") {
            self.logging.format = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.stream.retry_ms, 10_000);
        assert!(!config.stream.counter_as_id);
        assert_eq!(config.stream.write_timeout(), Duration::from_secs(30));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [stream]
            retry_ms = 2500
            counter_as_id = true

            [logging]
            level = "debug"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.stream.retry_ms, 2500);
        assert!(config.stream.counter_as_id);
        assert_eq!(config.stream.write_timeout_secs, 30);
        assert_eq!(config.logging.level, "debug");
    }
}
