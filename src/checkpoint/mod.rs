//! Checkpoint and resume for state machines.
//!
//! A checkpoint captures the committed state and its history so a machine
//! can be rebuilt after a restart with `StateMachineBuilder::resume`.
//! Transitions, rules and effects are code, not data, and are not captured.

use crate::core::{State, StateHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a machine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Checkpoint<S: State> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// Machine the checkpoint was taken from
    pub machine_id: Uuid,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Committed state at the time of the snapshot
    pub current_state: S,

    /// Recorded transition history
    pub history: StateHistory<S>,
}

impl<S: State> Checkpoint<S> {
    pub fn new(machine_id: Uuid, current_state: S, history: StateHistory<S>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            machine_id,
            timestamp: Utc::now(),
            current_state,
            history,
        }
    }

    /// Check version and that the history ends in the current state.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        if let Some(last) = self.history.last() {
            if last.to != self.current_state {
                return Err(CheckpointError::InconsistentHistory {
                    last: last.to.name().to_string(),
                    current: self.current_state.name().to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::Decode(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    /// Compact binary encoding.
    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::Decode(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }
}
