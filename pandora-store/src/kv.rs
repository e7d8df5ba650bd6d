use dashmap::DashMap;
use pandora_core::PandoraError;
use std::sync::Arc;

/// Synchronous string-keyed store. No transactions, no expiry.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PandoraError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PandoraError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, PandoraError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PandoraError> {
        (**self).set(key, value)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, PandoraError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PandoraError> {
        (**self).set(key, value)
    }
}

/// In-memory store. Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every key.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PandoraError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PandoraError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
