//! Process settings: which account and resource kind to reconcile, logging,
//! and per-operation timeouts.
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables such as `EVENTSUB__TIMEOUTS__CREATE_SECS=600`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use eventsub_core::ResourceKind;

use crate::{ConfigError, Result};

pub const DEFAULT_SETTINGS_FILE: &str = "eventsub.toml";
pub const ENV_PREFIX: &str = "EVENTSUB";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Account the system topic lives in. Unused for scoped subscriptions.
    #[serde(default)]
    pub subscription_id: String,
    #[serde(default = "default_resource_kind")]
    pub resource_kind: ResourceKind,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub level: String,
}

/// Upper bounds for each remote operation, including the long-running wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_write_secs")]
    pub create_secs: u64,
    #[serde(default = "default_read_secs")]
    pub read_secs: u64,
    #[serde(default = "default_write_secs")]
    pub update_secs: u64,
    #[serde(default = "default_write_secs")]
    pub delete_secs: u64,
}

fn default_resource_kind() -> ResourceKind {
    ResourceKind::SystemTopicEventSubscription
}

fn default_level() -> String {
    "info".to_string()
}

fn default_write_secs() -> u64 {
    30 * 60
}

fn default_read_secs() -> u64 {
    5 * 60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            subscription_id: String::new(),
            resource_kind: default_resource_kind(),
            logging: LoggingSettings::default(),
            timeouts: TimeoutSettings::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            create_secs: default_write_secs(),
            read_secs: default_read_secs(),
            update_secs: default_write_secs(),
            delete_secs: default_write_secs(),
        }
    }
}

impl TimeoutSettings {
    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create_secs)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn update(&self) -> Duration {
        Duration::from_secs(self.update_secs)
    }

    pub fn delete(&self) -> Duration {
        Duration::from_secs(self.delete_secs)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::settings(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        let t = &self.timeouts;
        if t.create_secs == 0 || t.read_secs == 0 || t.update_secs == 0 || t.delete_secs == 0 {
            return Err(ConfigError::settings("timeouts must be > 0"));
        }
        if self.resource_kind == ResourceKind::SystemTopicEventSubscription
            && self.subscription_id.is_empty()
        {
            return Err(ConfigError::settings(
                "subscription_id is required for system topic event subscriptions",
            ));
        }
        Ok(())
    }
}

/// Loads settings from `path` (or `eventsub.toml` in the working directory)
/// when the file exists, applies `EVENTSUB__*` overrides, then validates.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut builder = Config::builder();
    let file = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    if file.exists() {
        builder = builder.add_source(File::from(file));
    }
    // Environment variable overrides, e.g. EVENTSUB__LOGGING__LEVEL=debug
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__"),
    );
    let cfg = builder
        .build()
        .map_err(|e| ConfigError::settings(format!("config build error: {e}")))?;
    let settings: Settings = cfg
        .try_deserialize()
        .map_err(|e| ConfigError::settings(format!("config deserialize error: {e}")))?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_operation_timeouts() {
        let settings = Settings::default();
        assert_eq!(settings.timeouts.create(), Duration::from_secs(1800));
        assert_eq!(settings.timeouts.read(), Duration::from_secs(300));
        assert_eq!(settings.timeouts.update(), Duration::from_secs(1800));
        assert_eq!(settings.timeouts.delete(), Duration::from_secs(1800));
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let mut settings = Settings {
            subscription_id: "0000".into(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
        settings.logging.level = "loud".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_system_topic_kind_needs_subscription_id() {
        let settings = Settings::default();
        assert!(settings.validate().is_err());

        let scoped = Settings {
            resource_kind: ResourceKind::EventSubscription,
            ..Default::default()
        };
        assert!(scoped.validate().is_ok());
    }
}
