//! In-memory key-value store

use crate::error::{StoreError, StoreResult};
use crate::kv::{KeyValueStore, KvOp, PrefValue};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

pub(crate) fn apply_ops(map: &mut BTreeMap<String, PrefValue>, ops: Vec<KvOp>) {
    for op in ops {
        match op {
            KvOp::Set(key, value) => {
                map.insert(key, value);
            }
            KvOp::Remove(key) => {
                map.remove(&key);
            }
        }
    }
}

/// Map-backed store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<BTreeMap<String, PrefValue>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While unavailable, every read and write fails with `StoreError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> BTreeMap<String, PrefValue> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, PrefValue>> {
        self.map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<PrefValue>> {
        self.check()?;
        Ok(self.lock().get(key).cloned())
    }

    fn apply(&self, ops: Vec<KvOp>) -> StoreResult<()> {
        self.check()?;
        apply_ops(&mut self.lock(), ops);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        self.check()?;
        Ok(self.lock().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_applies_in_order() {
        let store = MemoryStore::new();
        store
            .apply(vec![
                KvOp::set("a", PrefValue::Int(1)),
                KvOp::remove("a"),
                KvOp::set("b", PrefValue::Int(2)),
            ])
            .unwrap();

        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get_int("b").unwrap(), Some(2));
    }

    #[test]
    fn test_unavailable() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.get("a"), Err(StoreError::Unavailable)));
        assert!(store.set("a", PrefValue::Int(1)).is_err());
        store.set_unavailable(false);
        assert_eq!(store.get("a").unwrap(), None);
    }
}
