//! Build errors for state machine and transition builders.

use crate::checkpoint::CheckpointError;
use crate::engine::MachineError;
use thiserror::Error;

/// Errors that can occur when building state machines and transitions.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Transition event not specified. Call .on(event)")]
    MissingEvent,

    #[error("Transition source state not specified. Call .from(state)")]
    MissingFromState,

    #[error("Transition target state not specified. Call .to(state)")]
    MissingToState,

    #[error("Invalid transition table: {0}")]
    InvalidTable(#[from] MachineError),

    #[error("Cannot resume from checkpoint: {0}")]
    InvalidCheckpoint(#[from] CheckpointError),

    #[error("Failed to spawn machine lane: {0}")]
    LaneSpawn(#[from] std::io::Error),
}
