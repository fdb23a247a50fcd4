//! The flat key-value store interface

use crate::error::StoreResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A stored preference value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Int(i64),
    Text(String),
    TextSet(BTreeSet<String>),
}

impl PrefValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PrefValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PrefValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            PrefValue::TextSet(v) => Some(v),
            _ => None,
        }
    }
}

/// A single-key write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvOp {
    Set(String, PrefValue),
    Remove(String),
}

impl KvOp {
    pub fn set(key: impl Into<String>, value: PrefValue) -> Self {
        KvOp::Set(key.into(), value)
    }

    pub fn remove(key: impl Into<String>) -> Self {
        KvOp::Remove(key.into())
    }

    pub fn key(&self) -> &str {
        match self {
            KvOp::Set(key, _) | KvOp::Remove(key) => key,
        }
    }
}

/// Flat key-value preference store
///
/// `apply` is the only write path and must make the whole batch visible at
/// once: a reader never observes a prefix of the operations.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<PrefValue>>;

    fn apply(&self, ops: Vec<KvOp>) -> StoreResult<()>;

    /// All keys, in ascending order
    fn keys(&self) -> StoreResult<Vec<String>>;

    fn set(&self, key: &str, value: PrefValue) -> StoreResult<()> {
        self.apply(vec![KvOp::set(key, value)])
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.apply(vec![KvOp::remove(key)])
    }

    /// Integer value; a value of another type reads as absent
    fn get_int(&self, key: &str) -> StoreResult<Option<i64>> {
        Ok(self.get(key)?.and_then(|v| v.as_int()))
    }

    fn get_text(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.get(key)?.and_then(|v| v.as_text().map(str::to_string)))
    }

    fn get_set(&self, key: &str) -> StoreResult<BTreeSet<String>> {
        Ok(self
            .get(key)?
            .and_then(|v| v.as_set().cloned())
            .unwrap_or_default())
    }
}
