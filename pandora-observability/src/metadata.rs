//! Structured payloads attached to log entries.
//!
//! [`MetaData`] is a shared, mutable handle over a closed recursive variant
//! ([`MetaValue`]). Because children are handles too, a payload can reference
//! itself. [`MetaData::snapshot`] takes the JSON-safe deep copy stored in the
//! log history and reports such cycles instead of recursing forever.

use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Stored in place of a payload that could not be copied.
pub const CYCLIC_SENTINEL: &str = "Cyclic object value detected, could not parse";

/// The shape of one payload node.
#[derive(Debug, Clone)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    Sequence(Vec<MetaData>),
    Mapping(BTreeMap<String, MetaData>),
}

/// Shared handle to a payload node. Clones point at the same node.
#[derive(Debug, Clone)]
pub struct MetaData(Arc<RwLock<MetaValue>>);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cyclic metadata value")]
pub struct CyclicMetaData;

impl MetaData {
    pub fn new(value: MetaValue) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    pub fn null() -> Self {
        Self::new(MetaValue::Null)
    }

    /// Empty sequence node.
    pub fn sequence() -> Self {
        Self::new(MetaValue::Sequence(Vec::new()))
    }

    /// Empty mapping node.
    pub fn mapping() -> Self {
        Self::new(MetaValue::Mapping(BTreeMap::new()))
    }

    /// Replace this node's contents. Every clone of the handle observes the change.
    pub fn set(&self, value: impl Into<MetaValue>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = value.into();
    }

    /// Insert `child` under `key`. Returns `false` if this node is not a mapping.
    pub fn insert(&self, key: impl Into<String>, child: impl Into<MetaData>) -> bool {
        match &mut *self.0.write().unwrap_or_else(PoisonError::into_inner) {
            MetaValue::Mapping(map) => {
                map.insert(key.into(), child.into());
                true
            }
            _ => false,
        }
    }

    /// Append `child`. Returns `false` if this node is not a sequence.
    pub fn push(&self, child: impl Into<MetaData>) -> bool {
        match &mut *self.0.write().unwrap_or_else(PoisonError::into_inner) {
            MetaValue::Sequence(items) => {
                items.push(child.into());
                true
            }
            _ => false,
        }
    }

    /// Child under `key`, if this node is a mapping that has it.
    pub fn get(&self, key: &str) -> Option<MetaData> {
        match &*self.0.read().unwrap_or_else(PoisonError::into_inner) {
            MetaValue::Mapping(map) => map.get(key).cloned(),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &MetaData) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Deep copy into a plain JSON value.
    ///
    /// Shared (non-cyclic) children are copied once per occurrence. A node
    /// that is its own ancestor yields [`CyclicMetaData`].
    pub fn snapshot(&self) -> Result<Value, CyclicMetaData> {
        let mut path = HashSet::new();
        self.snapshot_inner(&mut path)
    }

    /// Deep copy, substituting [`CYCLIC_SENTINEL`] for cyclic payloads.
    pub fn snapshot_or_sentinel(&self) -> Value {
        self.snapshot()
            .unwrap_or_else(|_| Value::String(CYCLIC_SENTINEL.to_string()))
    }

    fn snapshot_inner(&self, path: &mut HashSet<usize>) -> Result<Value, CyclicMetaData> {
        // Checked before locking so an ancestor is never locked twice.
        let id = Arc::as_ptr(&self.0) as usize;
        if !path.insert(id) {
            return Err(CyclicMetaData);
        }

        let result = match &*self.0.read().unwrap_or_else(PoisonError::into_inner) {
            MetaValue::Null => Ok(Value::Null),
            MetaValue::Bool(b) => Ok(Value::Bool(*b)),
            MetaValue::Number(n) => Ok(Value::Number(n.clone())),
            MetaValue::Text(s) => Ok(Value::String(s.clone())),
            MetaValue::Sequence(items) => items
                .iter()
                .map(|item| item.snapshot_inner(path))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            MetaValue::Mapping(map) => {
                let mut out = Map::new();
                for (key, child) in map {
                    out.insert(key.clone(), child.snapshot_inner(path)?);
                }
                Ok(Value::Object(out))
            }
        };

        path.remove(&id);
        result
    }
}

impl Default for MetaData {
    fn default() -> Self {
        Self::null()
    }
}

// ── Conversions ───────────────────────────────────────────────

impl From<Value> for MetaValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => MetaValue::Null,
            Value::Bool(b) => MetaValue::Bool(b),
            Value::Number(n) => MetaValue::Number(n),
            Value::String(s) => MetaValue::Text(s),
            Value::Array(items) => {
                MetaValue::Sequence(items.into_iter().map(MetaData::from).collect())
            }
            Value::Object(map) => MetaValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, MetaData::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for MetaData {
    fn from(value: Value) -> Self {
        Self::new(value.into())
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Number(value.into())
    }
}

impl From<u64> for MetaValue {
    fn from(value: u64) -> Self {
        MetaValue::Number(value.into())
    }
}

/// Non-finite floats have no JSON form and become `Null`.
impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(MetaValue::Number)
            .unwrap_or(MetaValue::Null)
    }
}

impl From<&str> for MetaData {
    fn from(value: &str) -> Self {
        Self::new(value.into())
    }
}

impl From<String> for MetaData {
    fn from(value: String) -> Self {
        Self::new(value.into())
    }
}

impl From<bool> for MetaData {
    fn from(value: bool) -> Self {
        Self::new(value.into())
    }
}

impl From<i64> for MetaData {
    fn from(value: i64) -> Self {
        Self::new(value.into())
    }
}

impl From<u64> for MetaData {
    fn from(value: u64) -> Self {
        Self::new(value.into())
    }
}

impl From<f64> for MetaData {
    fn from(value: f64) -> Self {
        Self::new(value.into())
    }
}

impl From<MetaValue> for MetaData {
    fn from(value: MetaValue) -> Self {
        Self::new(value)
    }
}
