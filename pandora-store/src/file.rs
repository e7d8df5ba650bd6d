//! File-backed key-value store.
//!
//! All keys live in one JSON object file. The file is read once on open and
//! rewritten on every `set`. A `set` whose write fails leaves memory unchanged,
//! so the on-disk state always matches memory.
//!
//! Writes are atomic: first to a `.tmp` sibling, then renamed over the final
//! path, so a crash mid-write never leaves a half-written file behind.

use crate::kv::KeyValueStore;
use pandora_core::PandoraError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// * If the file does not exist          → starts empty (first run).
    /// * If the file exists but is unreadable or malformed → logs a warning and starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PandoraError> {
        let path = path.into();
        let entries = if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(data) => match serde_json::from_str::<BTreeMap<String, String>>(&data) {
                    Ok(entries) => {
                        tracing::debug!(path = %path.display(), keys = entries.len(), "store: state loaded");
                        entries
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, path = %path.display(), "store: state file is malformed, ignoring");
                        BTreeMap::new()
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "store: failed to read state file, ignoring");
                    BTreeMap::new()
                }
            }
        } else {
            tracing::debug!(path = %path.display(), "store: no state file found, starting fresh");
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

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), PandoraError> {
        let json = serde_json::to_string_pretty(entries)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic write: tmp file → rename
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), "store: state saved");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PandoraError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PandoraError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}
