//! In-process storage.

use super::{StateStorage, StorageError, STATE_KEY};
use crate::engine::lock_recover;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Key-value storage living in process memory.
///
/// The default storage of a machine; contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Value>, StorageError> {
        Ok(lock_recover(&self.entries).get(STATE_KEY).cloned())
    }

    fn save(&self, value: Option<Value>) -> Result<(), StorageError> {
        let mut entries = lock_recover(&self.entries);
        match value {
            Some(value) => {
                entries.insert(STATE_KEY.to_string(), value);
            }
            None => {
                entries.remove(STATE_KEY);
            }
        }
        Ok(())
    }
}
