//! Server configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Arena server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite file for match history.
    #[serde(default = "default_db_path")]
    db_path: String,

    /// Seconds a room may wait for a challenger. Unset means forever.
    #[serde(default)]
    room_idle_ttl_secs: Option<u64>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "strictly_arena.db".to_string()
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            room_idle_ttl_secs: None,
        }
    }
}

impl ArenaConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        if config.room_idle_ttl_secs == Some(0) {
            return Err(ConfigError::new(
                "room_idle_ttl_secs must be positive when set".to_string(),
            ));
        }
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Applies command-line overrides.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        db_path: Option<String>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(db_path) = db_path {
            self.db_path = db_path;
        }
        self
    }

    /// Address to bind, as `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Idle timeout for rooms awaiting a challenger.
    pub fn idle_ttl(&self) -> Option<Duration> {
        self.room_idle_ttl_secs.map(Duration::from_secs)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ArenaConfig::from_toml("").unwrap();
        assert_eq!(config, ArenaConfig::default());
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
        assert!(config.idle_ttl().is_none());
    }

    #[test]
    fn test_partial_toml_and_overrides() {
        let config = ArenaConfig::from_toml("port = 8080\nroom_idle_ttl_secs = 30\n").unwrap();
        assert_eq!(*config.port(), 8080);
        assert_eq!(config.idle_ttl(), Some(Duration::from_secs(30)));

        let config = config.with_overrides(Some("0.0.0.0".to_string()), None, None);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert!(ArenaConfig::from_toml("room_idle_ttl_secs = 0").is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(ArenaConfig::from_file("/nonexistent/arena.toml").is_err());
    }
}
