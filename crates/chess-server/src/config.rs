//! Configuration file loading for the chess server.
//!
//! Every field has a default, so an absent file or an empty one yields a
//! working server on port 31415.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// A value is outside its allowed range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Server settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// TCP port for all client traffic.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Address to bind the listener to.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Capacity of the lobby connection registry.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Capacity of the game registry.
    #[serde(default = "default_max_games")]
    pub max_games: usize,
    /// Spectators allowed per game.
    #[serde(default = "default_max_spectators")]
    pub max_spectators: usize,
    /// How long the hub and each game wait for input per polling cycle.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
}

fn default_port() -> u16 {
    31415
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_max_connections() -> usize {
    16
}

fn default_max_games() -> usize {
    8
}

fn default_max_spectators() -> usize {
    8
}

fn default_poll_timeout_ms() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            max_games: default_max_games(),
            max_spectators: default_max_spectators(),
            poll_timeout_ms: default_poll_timeout_ms(),
        }
    }
}

impl ServerConfig {
    /// Loads the configuration from `path`.
    ///
    /// A missing file is not an error: the defaults are returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// [`ConfigError::ParseError`] if it is not valid TOML for this structure,
    /// or [`ConfigError::Invalid`] if a capacity is zero.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every capacity can hold at least one entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.max_games == 0 {
            return Err(ConfigError::Invalid("max_games must be at least 1".to_string()));
        }
        if self.poll_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The `host:port` string to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// The bounded multiplexing wait.
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}
