//! Per-machine configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid machine configuration: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Tunables for a single machine.
///
/// Missing fields fall back to `MachineConfig::default()` when deserializing.
///
/// # Example
///
/// ```rust
/// use statelane::config::MachineConfig;
///
/// let config = MachineConfig::from_json(r#"{ "lane_name": "checkout", "history_limit": 16 }"#)
///     .unwrap();
///
/// assert_eq!(config.lane_name, "checkout");
/// assert_eq!(config.history_limit, Some(16));
/// assert!(config.record_history);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Thread name of the processing lane; the default callback queue
    /// appends `-callbacks`.
    pub lane_name: String,

    /// Log every processed event at `info`/`debug` level.
    pub log_transitions: bool,

    /// Keep a `StateHistory` of committed transitions.
    pub record_history: bool,

    /// Upper bound on retained history entries; `None` keeps everything.
    pub history_limit: Option<usize>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            lane_name: "statelane".to_string(),
            log_transitions: cfg!(debug_assertions),
            record_history: true,
            history_limit: Some(256),
        }
    }
}

impl MachineConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn callback_queue_name(&self) -> String {
        format!("{}-callbacks", self.lane_name)
    }
}
