//! Checkpoint error types.

use thiserror::Error;

/// Errors raised while encoding, decoding or validating a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to encode checkpoint: {0}")]
    Encode(String),

    #[error("Failed to decode checkpoint: {0}")]
    Decode(String),

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The recorded history does not lead to the captured state
    #[error("Checkpoint history ends in '{last}' but current state is '{current}'")]
    InconsistentHistory { last: String, current: String },
}
