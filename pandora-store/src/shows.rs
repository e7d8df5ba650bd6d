use crate::kv::KeyValueStore;
use pandora_core::{PandoraError, Show};
use tracing::{debug, warn};

/// Default key-value slot holding the JSON-encoded show list.
pub const SHOWS_KEY: &str = "PANDORA_SHOWS";

/// CRUD over the show list stored as one JSON array in a key-value slot.
///
/// Every mutation reads the whole list, changes it in memory and writes the
/// whole list back. There is no locking: two processes sharing the same store
/// can overwrite each other's changes.
pub struct ShowRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> ShowRepository<S> {
    /// Repository over the default `PANDORA_SHOWS` slot.
    pub fn new(store: S) -> Result<Self, PandoraError> {
        Self::with_key(store, SHOWS_KEY)
    }

    /// Repository over a custom slot. Initializes the slot to `[]` if it is absent or empty.
    pub fn with_key(store: S, key: impl Into<String>) -> Result<Self, PandoraError> {
        let repo = Self {
            store,
            key: key.into(),
        };
        let existing = repo.store.get(&repo.key)?;
        if existing.as_deref().is_none_or(str::is_empty) {
            repo.store.set(&repo.key, "[]")?;
            debug!(key = %repo.key, "shows: initialized empty slot");
        }
        Ok(repo)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// All shows in stored order.
    ///
    /// A missing slot or a slot that does not hold a JSON array of shows reads
    /// as an empty list rather than an error.
    pub fn list(&self) -> Result<Vec<Show>, PandoraError> {
        let Some(raw) = self.store.get(&self.key)? else {
            warn!(key = %self.key, "shows: slot missing, treating as empty");
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<Show>>(&raw) {
            Ok(shows) => Ok(shows),
            Err(e) => {
                warn!(error = %e, key = %self.key, "shows: slot is corrupt, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Append a show with the given name.
    pub fn add(&self, name: &str) -> Result<(), PandoraError> {
        let show = Show::new(name)?;
        let mut shows = self.list()?;
        shows.push(show);
        self.save(&shows)
    }

    /// Remove the first show with the given name. Unknown names leave the list unchanged.
    pub fn delete(&self, name: &str) -> Result<(), PandoraError> {
        let mut shows = self.list()?;
        if let Some(index) = shows.iter().position(|s| s.name == name) {
            shows.remove(index);
        } else {
            debug!(name, "shows: delete of unknown show is a no-op");
        }
        self.save(&shows)
    }

    /// Replace the first show named `name` with `replacement`, keeping its position.
    ///
    /// Returns `false` and writes nothing when no show has that name.
    pub fn update(&self, name: &str, replacement: Show) -> Result<bool, PandoraError> {
        let mut shows = self.list()?;
        let Some(slot) = shows.iter_mut().find(|s| s.name == name) else {
            return Ok(false);
        };
        *slot = replacement;
        self.save(&shows)?;
        Ok(true)
    }

    fn save(&self, shows: &[Show]) -> Result<(), PandoraError> {
        let json = serde_json::to_string(shows)?;
        self.store.set(&self.key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    #[test]
    fn construction_initializes_absent_slot() {
        let store = MemoryStore::new();
        let _repo = ShowRepository::new(store.clone()).unwrap();
        assert_eq!(store.get(SHOWS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn construction_initializes_empty_string_slot() {
        let store = MemoryStore::new();
        store.set(SHOWS_KEY, "").unwrap();
        let _repo = ShowRepository::new(store.clone()).unwrap();
        assert_eq!(store.get(SHOWS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn construction_keeps_existing_slot() {
        let store = MemoryStore::new();
        store.set(SHOWS_KEY, r#"[{"name":"Dark"}]"#).unwrap();
        let repo = ShowRepository::new(store.clone()).unwrap();
        assert_eq!(repo.list().unwrap(), vec![Show::new("Dark").unwrap()]);
    }

    #[test]
    fn custom_key_is_used() {
        let store = MemoryStore::new();
        let repo = ShowRepository::with_key(store.clone(), "OTHER").unwrap();
        repo.add("Lost").unwrap();
        assert_eq!(repo.key(), "OTHER");
        assert_eq!(store.get("OTHER").unwrap().as_deref(), Some(r#"[{"name":"Lost"}]"#));
        assert_eq!(store.get(SHOWS_KEY).unwrap(), None);
    }
}
