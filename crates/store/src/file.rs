//! JSON file-backed key-value store
//!
//! The whole map is rewritten on every batch through a temporary file in the
//! same directory and an atomic rename, so the file on disk always holds a
//! complete batch boundary.

use crate::error::{StoreError, StoreResult};
use crate::kv::{KeyValueStore, KvOp, PrefValue};
use crate::memory::apply_ops;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

type StateMap = BTreeMap<String, PrefValue>;

pub struct FileStore {
    path: PathBuf,
    map: Mutex<StateMap>,
}

impl FileStore {
    /// Opens the store at `path`
    ///
    /// A missing file starts empty. A file that cannot be parsed is moved
    /// aside to `<name>.corrupt` and the store starts empty.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let map = load_map(&path)?;
        debug!("Opened state file {} ({} keys)", path.display(), map.len());
        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, StateMap> {
        self.map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, map: &StateMap) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| StoreError::Write {
            path: dir.clone(),
            source: e,
        })?;

        let json = serde_json::to_vec_pretty(map)?;
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let mut temp = NamedTempFile::new_in(&dir).map_err(write_err)?;
        temp.write_all(&json).map_err(write_err)?;
        temp.flush().map_err(write_err)?;
        temp.persist(&self.path)
            .map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

fn load_map(path: &Path) -> StoreResult<StateMap> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("State file {} not found, starting empty", path.display());
            return Ok(StateMap::new());
        }
        Err(e) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    match serde_json::from_slice::<StateMap>(&bytes) {
        Ok(map) => Ok(map),
        Err(e) => {
            let aside = path.with_extension("corrupt");
            warn!(
                "State file {} is corrupt ({}), moving it to {}",
                path.display(),
                e,
                aside.display()
            );
            if let Err(rename_err) = fs::rename(path, &aside) {
                warn!("Could not move corrupt state file: {}", rename_err);
            }
            Ok(StateMap::new())
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<PrefValue>> {
        Ok(self.lock().get(key).cloned())
    }

    fn apply(&self, ops: Vec<KvOp>) -> StoreResult<()> {
        let mut map = self.lock();
        let mut next = map.clone();
        apply_ops(&mut next, ops);
        // Memory only changes once the file write succeeded
        self.persist(&next)?;
        *map = next;
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path().join("state.json")).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("state.json");

        let store = FileStore::open(&path).unwrap();
        store
            .apply(vec![
                KvOp::set("chapter_Dune", PrefValue::Int(1)),
                KvOp::set("selected_book", PrefValue::Text("Dune".to_string())),
            ])
            .unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_int("chapter_Dune").unwrap(), Some(1));
        assert_eq!(
            reopened.get_text("selected_book").unwrap().as_deref(),
            Some("Dune")
        );
    }

    #[test]
    fn test_corrupt_file_moved_aside() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");
        fs::write(&path, b"{ not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.keys().unwrap().is_empty());
        assert!(temp_dir.path().join("state.corrupt").exists());
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail
        let path = temp_dir.path().join("state.json");
        fs::create_dir(&path).unwrap();
        let store = FileStore {
            path: path.clone(),
            map: Mutex::new(StateMap::new()),
        };

        assert!(store.set("k", PrefValue::Int(1)).is_err());
        assert_eq!(store.get("k").unwrap(), None);
    }
}
