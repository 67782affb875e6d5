//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. `$AGS_STATE_PATH` for the state location
//! 4. CLI flags (not handled here)
//!
//! # Config File Locations
//!
//! Searched in order:
//! 1. An explicit path (e.g. `--config`)
//! 2. `$AGS_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/agentstate/config.toml`
//! 4. `~/.agentstate/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use agentstate::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("State file: {}", config.state_path().display());
//! println!("Attempts: {}", config.retry_policy().max_attempts);
//! ```

pub mod schema;

pub use schema::{RetryConfig, StoreConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::paths::DEFAULT_STATE_PATH;
use crate::core::store::{RetryPolicy, StoreOptions};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "AGS_CONFIG";

/// Environment variable overriding the state file location.
pub const STATE_PATH_ENV: &str = "AGS_STATE_PATH";

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
const DEFAULT_HEARTBEAT_MS: u64 = 15_000;
const DEFAULT_LOCK_TTL_MS: u64 = 60_000;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Resolved configuration.
///
/// Accessors apply defaults for anything the file left unset.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values read from the config file (if any).
    pub store: StoreConfig,
    /// Path to the config file that was loaded.
    source: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed, or
    /// validated. A missing file is not an error; defaults are used. An
    /// explicit path that does not exist is a read error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let found = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        let mut config = match found {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Ok(state_path) = std::env::var(STATE_PATH_ENV) {
            if !state_path.is_empty() {
                config.store.state_path = Some(PathBuf::from(state_path));
            }
        }

        config.store.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a single config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let store: StoreConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        store.validate()?;

        Ok(Self {
            store,
            source: Some(path.to_path_buf()),
        })
    }

    fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("agentstate/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = dirs::home_dir()?.join(".agentstate/config.toml");
        path.exists().then_some(path)
    }

    /// Override the state file location (CLI `--state`).
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.state_path = Some(path.into());
        self
    }

    /// Path of the loaded config file, if one was found.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Durable document location.
    pub fn state_path(&self) -> PathBuf {
        self.store
            .state_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH))
    }

    /// Max wait for the sidecar write lock.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.store.lock_timeout_ms.unwrap_or(DEFAULT_LOCK_TIMEOUT_MS))
    }

    /// Notifier recheck interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.store
                .poll_interval_ms
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        )
    }

    /// Revision-stream heartbeat.
    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.store.heartbeat_ms.unwrap_or(DEFAULT_HEARTBEAT_MS))
    }

    /// Default TTL for lock acquisition from the CLI.
    pub fn default_lock_ttl(&self) -> Duration {
        Duration::from_millis(self.store.default_lock_ttl_ms.unwrap_or(DEFAULT_LOCK_TTL_MS))
    }

    /// Transaction retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        let retry = self.store.retry.clone().unwrap_or_default();
        RetryPolicy {
            max_attempts: retry.max_attempts.unwrap_or(defaults.max_attempts),
            backoff_base: retry
                .backoff_base_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.backoff_base),
        }
    }

    /// Store options derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            lock_timeout: self.lock_timeout(),
            poll_interval: self.poll_interval(),
            retry: self.retry_policy(),
        }
    }
}
