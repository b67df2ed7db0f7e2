//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::application::services::DeliveryTiming;

/// Inbox configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub inbox: InboxConfig,
    pub simulation: SimulationConfig,
    pub storage: StorageConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InboxConfig {
    pub name: String,
    pub current_user_id: String,
    pub command_prefix: String,
}

/// Delays of the simulated delivered/read progression, from send time
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulationConfig {
    pub delivered_after_ms: u64,
    pub read_after_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    pub state_path: PathBuf,
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NotificationConfig {
    pub seed_defaults: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inbox: InboxConfig {
                name: "campus-inbox".to_string(),
                current_user_id: "user-1".to_string(),
                command_prefix: "/".to_string(),
            },
            simulation: SimulationConfig {
                delivered_after_ms: 500,
                read_after_ms: 1500,
            },
            storage: StorageConfig {
                state_path: PathBuf::from("campus-inbox-state.json"),
                seed_path: None,
            },
            notifications: NotificationConfig {
                seed_defaults: true,
            },
        }
    }
}

impl SimulationConfig {
    pub fn timing(&self) -> Result<DeliveryTiming, ConfigError> {
        DeliveryTiming::new(
            Duration::from_millis(self.delivered_after_ms),
            Duration::from_millis(self.read_after_ms),
        )
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inbox.current_user_id.trim().is_empty() {
            return Err(ConfigError::MissingField("inbox.current-user-id".to_string()));
        }
        if self.inbox.command_prefix.is_empty() {
            return Err(ConfigError::MissingField("inbox.command-prefix".to_string()));
        }

        self.simulation.timing()?;
        Ok(())
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        if let Ok(user) = std::env::var("INBOX_USER_ID") {
            config.inbox.current_user_id = user;
        }

        if let Ok(path) = std::env::var("INBOX_STATE_PATH") {
            config.storage.state_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("INBOX_SEED_PATH") {
            config.storage.seed_path = Some(PathBuf::from(path));
        }

        if let Some(ms) = env_millis("INBOX_DELIVERED_MS") {
            config.simulation.delivered_after_ms = ms;
        }

        if let Some(ms) = env_millis("INBOX_READ_MS") {
            config.simulation.read_after_ms = ms;
        }

        config
    }
}

fn env_millis(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(ms) => Some(ms),
        Err(_) => {
            tracing::warn!("Ignoring {}={}: not a number of milliseconds", key, raw);
            None
        }
    }
}
