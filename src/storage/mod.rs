//! Persistence of the current state.
//!
//! The machine stores its state as one JSON scalar under a fixed key. It
//! never persists on its own: storage is touched only through
//! `StateMachine::store_current_state`, `clear_state_storage` and
//! `restored_state`.

mod error;
mod file;
mod memory;

pub use error::StorageError;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde_json::Value;

/// Key under which the state is persisted.
pub const STATE_KEY: &str = "STATE";

/// Key-value persistence collaborator.
pub trait StateStorage: Send + Sync {
    /// Read the stored state, if any.
    fn load(&self) -> Result<Option<Value>, StorageError>;

    /// Replace the stored state; `None` removes it.
    fn save(&self, value: Option<Value>) -> Result<(), StorageError>;
}
