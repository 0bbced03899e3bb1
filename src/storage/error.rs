//! Storage error types.

use thiserror::Error;

/// Errors that can occur while reading or writing persisted state
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backing store could not be read or written
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// State could not be encoded
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Stored data could not be decoded
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
}
