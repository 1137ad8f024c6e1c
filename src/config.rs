//! Configuration loading and validation.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_IDLE_SECS: u64 = 30;
const DEFAULT_OUTBOUND_CAPACITY: usize = 100;

/// Relaybot configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Telegram connection settings.
    pub telegram: TelegramConfig,

    /// Enable debug logging.
    pub debug: bool,

    /// Seconds without any event before an idle message is dispatched.
    pub idle_secs: u64,

    /// Capacity of the outbound submission queue.
    pub outbound_capacity: usize,

    /// Privileged user handles, consulted by responders.
    pub super_users: Vec<String>,

    /// Directory for the message log database.
    pub data_dir: PathBuf,
}

/// Telegram connection settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API token.
    pub token: String,

    /// Target group: numeric chat id or public handle, `@` optional.
    pub group: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            debug: false,
            idle_secs: DEFAULT_IDLE_SECS,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            super_users: Vec::new(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("relaybot"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Settings consumed by the event loop.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub group: String,
    pub idle_duration: Duration,
    pub outbound_capacity: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            group: String::new(),
            idle_duration: Duration::from_secs(DEFAULT_IDLE_SECS),
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then apply environment
    /// overrides, then `overrides` (command line flags), then validate.
    pub fn load(path: Option<&Path>, overrides: impl FnOnce(&mut Self)) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file without environment overrides or validation.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Load {
            path: path.display().to_string(),
            source: Arc::new(error),
        })?;
        Self::from_toml(&content)
    }

    /// Parse TOML config content.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content).map_err(ConfigError::from)?)
    }

    /// Apply overrides from a key lookup (the process environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("TELEGRAM_TOKEN") {
            self.telegram.token = token;
        }
        if let Some(group) = lookup("TELEGRAM_GROUP") {
            self.telegram.group = group;
        }
        if let Some(debug) = lookup("RELAYBOT_DEBUG") {
            self.debug = matches!(debug.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(data_dir) = lookup("RELAYBOT_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }
    }

    /// Check required keys and value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.token.trim().is_empty() {
            return Err(ConfigError::MissingKey("telegram.token".into()).into());
        }
        if self.telegram.group.trim().is_empty() {
            return Err(ConfigError::MissingKey("telegram.group".into()).into());
        }
        if self.idle_secs == 0 {
            return Err(ConfigError::Invalid("idle_secs must be greater than zero".into()).into());
        }
        if self.outbound_capacity == 0 {
            return Err(
                ConfigError::Invalid("outbound_capacity must be greater than zero".into()).into(),
            );
        }
        Ok(())
    }

    /// Event loop settings derived from this config.
    pub fn listener(&self) -> ListenerConfig {
        ListenerConfig {
            group: self.telegram.group.trim().trim_start_matches('@').to_string(),
            idle_duration: Duration::from_secs(self.idle_secs),
            outbound_capacity: self.outbound_capacity,
        }
    }

    /// Get the message log database path.
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("messages.db")
    }
}
