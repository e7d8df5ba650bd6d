use crate::error::PandoraError;
use serde::{Deserialize, Serialize};

/// A show on the personal list. The name is the only field and doubles as its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Show {
    pub name: String,
}

impl Show {
    /// Build a show, rejecting an empty name.
    pub fn new(name: impl Into<String>) -> Result<Self, PandoraError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PandoraError::InvalidShow("name must not be empty".into()));
        }
        Ok(Self { name })
    }
}

impl std::fmt::Display for Show {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
