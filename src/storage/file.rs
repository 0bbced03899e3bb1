//! JSON file storage.

use super::{StateStorage, StorageError, STATE_KEY};
use crate::engine::lock_recover;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage backed by a JSON object on disk.
///
/// The file holds a key-value map so it can be shared with other settings;
/// only the `STATE` entry is touched. A missing file reads as empty.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(StorageError::Deserialization(format!(
                "expected a JSON object in {}, found {}",
                self.path.display(),
                other
            ))),
            Err(err) => Err(StorageError::Deserialization(err.to_string())),
        }
    }

    fn write_map(&self, map: Map<String, Value>) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(&Value::Object(map))
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl StateStorage for FileStorage {
    fn load(&self) -> Result<Option<Value>, StorageError> {
        let _guard = lock_recover(&self.guard);
        Ok(self.read_map()?.remove(STATE_KEY))
    }

    fn save(&self, value: Option<Value>) -> Result<(), StorageError> {
        let _guard = lock_recover(&self.guard);
        let mut map = self.read_map()?;
        match value {
            Some(value) => {
                map.insert(STATE_KEY.to_string(), value);
            }
            None => {
                map.remove(STATE_KEY);
            }
        }
        self.write_map(map)
    }
}
