//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing: durations that drive loops must be
//! non-zero and the retry budget must allow at least one attempt.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Store configuration.
///
/// # Example
///
/// ```toml
/// state_path = "/var/lib/agents/state.json"
/// lock_timeout_ms = 10000
/// poll_interval_ms = 50
/// heartbeat_ms = 15000
/// default_lock_ttl_ms = 60000
///
/// [retry]
/// max_attempts = 5
/// backoff_base_ms = 0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Durable document location
    pub state_path: Option<PathBuf>,

    /// Max wait for the sidecar write lock
    pub lock_timeout_ms: Option<u64>,

    /// Notifier recheck interval against disk
    pub poll_interval_ms: Option<u64>,

    /// Default revision-stream heartbeat
    pub heartbeat_ms: Option<u64>,

    /// Default TTL for CLI lock acquisition
    pub default_lock_ttl_ms: Option<u64>,

    /// Transaction retry settings
    pub retry: Option<RetryConfig>,
}

impl StoreConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.state_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "state_path must not be empty".into(),
                ));
            }
        }

        for (key, value) in [
            ("poll_interval_ms", self.poll_interval_ms),
            ("heartbeat_ms", self.heartbeat_ms),
        ] {
            if value == Some(0) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be greater than zero",
                    key
                )));
            }
        }

        if let Some(retry) = &self.retry {
            retry.validate()?;
        }

        Ok(())
    }
}

/// Transaction retry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Attempt budget per transaction
    pub max_attempts: Option<u32>,

    /// Base of the jittered linear backoff; 0 disables backoff
    pub backoff_base_ms: Option<u64>,
}

impl RetryConfig {
    /// Validate retry settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == Some(0) {
            return Err(ConfigError::InvalidValue(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
