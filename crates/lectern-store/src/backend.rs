//! Pluggable persistence backends.
//!
//! The contract mirrors a browser's key/value storage: `load` never fails
//! (anything unreadable degrades to `None`), `save` either fully succeeds
//! or leaves the previously persisted value intact.

use crate::error::StoreError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Synchronous key/value persistence for serialized collections.
pub trait StorageBackend: Send + Sync + 'static {
    /// Read the stored value for `key`, or `None` if absent or unreadable.
    fn load(&self, key: &str) -> Option<String>;

    /// Persist `value` under `key`. Must be atomic: on error the previous
    /// value is still observable through `load`.
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory backend used by tests and the simulation binaries.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-per-key backend. Writes go to a temp file first and are renamed
/// into place, so a crash or quota failure mid-write never corrupts the
/// previous value.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileBackend {
    fn load(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let wrap = |source: std::io::Error| StoreError::Backend {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(wrap)?;
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        fs::write(&tmp, value).map_err(wrap)?;
        fs::rename(&tmp, self.path_for(key)).map_err(wrap)
    }
}
