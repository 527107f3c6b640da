//! JSON file backed store.

use super::{SessionStore, StoreError, StoreResult};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Store persisting all entries as one JSON object, rewritten on every mutation
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading existing entries.
    ///
    /// A missing file starts empty. A corrupt file is logged and ignored so the
    /// user can log in afresh instead of being locked out.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| StoreError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
            match serde_json::from_str::<BTreeMap<String, String>>(&json) {
                Ok(entries) => {
                    info!("Loaded {} stored entries from {}", entries.len(), path.display());
                    entries
                }
                Err(e) => {
                    warn!("Ignoring unreadable session file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            debug!("No session file at {}", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("Failed to create directory: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        std::fs::write(&self.path, json)
            .map_err(|e| StoreError::Io(format!("Failed to write {}: {}", self.path.display(), e)))
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}
