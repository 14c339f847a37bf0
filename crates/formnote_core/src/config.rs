//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Resolve DB path, logging and platform settings from the environment.
//!
//! # Invariants
//! - Blank environment values behave as unset.
//! - Resolution never touches the file system.

use crate::logging::default_log_level;
use crate::permission::kind::NOTIFICATION_RUNTIME_GRANT_API_LEVEL;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "FORMNOTE_DB_PATH";
pub const ENV_LOG_DIR: &str = "FORMNOTE_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "FORMNOTE_LOG_LEVEL";
pub const ENV_API_LEVEL: &str = "FORMNOTE_API_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "formnote.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "formnote-logs";

/// Core settings shared by FFI and CLI hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    /// Platform API level used for permission rules.
    pub platform_api_level: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_dir: std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
            log_level: default_log_level().to_string(),
            platform_api_level: NOTIFICATION_RUNTIME_GRANT_API_LEVEL,
        }
    }
}

impl CoreConfig {
    /// Builds config from `FORMNOTE_*` environment variables over defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(dir) = value(ENV_LOG_DIR) {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(raw) = value(ENV_API_LEVEL) {
            config.platform_api_level = raw
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidApiLevel(raw))?;
        }
        Ok(config)
    }
}

/// Configuration resolution errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidApiLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidApiLevel(value) => {
                write!(f, "{ENV_API_LEVEL} must be a non-negative integer, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_API_LEVEL, ENV_DB_PATH, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config, CoreConfig::default());
        assert!(config.db_path.ends_with("formnote.sqlite3"));
    }

    #[test]
    fn overrides_and_blank_values() {
        let config = CoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, " /data/notes.db "),
            (ENV_LOG_LEVEL, "   "),
            (ENV_API_LEVEL, "30"),
        ]))
        .expect("config");
        assert_eq!(config.db_path, PathBuf::from("/data/notes.db"));
        assert_eq!(config.log_level, CoreConfig::default().log_level);
        assert_eq!(config.platform_api_level, 30);
    }

    #[test]
    fn rejects_invalid_api_level() {
        let err = CoreConfig::from_lookup(lookup(&[(ENV_API_LEVEL, "tiramisu")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidApiLevel("tiramisu".to_string()));
    }
}
