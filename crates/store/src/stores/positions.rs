//! Per-chapter positions and the per-book chapter pointer

use crate::error::StoreResult;
use crate::keys;
use crate::kv::{KeyValueStore, KvOp, PrefValue};
use log::{trace, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Positions are keyed by `(book, chapter display name)`.
///
/// Reads never fail: an unreadable store or a value of the wrong type reads
/// as the default.
#[derive(Clone)]
pub struct PositionStore {
    store: Arc<dyn KeyValueStore>,
}

impl PositionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Saved position in milliseconds, 0 if none
    pub fn get(&self, book: &str, chapter: &str) -> u64 {
        match self.store.get_int(&keys::position(book, chapter)) {
            Ok(Some(ms)) => u64::try_from(ms).unwrap_or(0),
            Ok(None) => 0,
            Err(e) => {
                warn!("Could not read position of {}/{}: {}", book, chapter, e);
                0
            }
        }
    }

    pub fn set(&self, book: &str, chapter: &str, position_ms: u64) -> StoreResult<()> {
        let mut batch = self.batch(book);
        batch.set(chapter, position_ms);
        self.store.apply(batch.into_ops())
    }

    pub fn clear(&self, book: &str, chapter: &str) -> StoreResult<()> {
        let mut batch = self.batch(book);
        batch.clear(chapter);
        self.store.apply(batch.into_ops())
    }

    /// Current chapter pointer of the book, 0 if none
    pub fn chapter_index(&self, book: &str) -> usize {
        match self.store.get_int(&keys::chapter_index(book)) {
            Ok(Some(index)) => usize::try_from(index).unwrap_or(0),
            Ok(None) => 0,
            Err(e) => {
                warn!("Could not read chapter pointer of {}: {}", book, e);
                0
            }
        }
    }

    pub fn set_chapter_index(&self, book: &str, index: usize) -> StoreResult<()> {
        self.store.set(&keys::chapter_index(book), int_value(index as u64))
    }

    /// Moves the chapter pointer and writes positions as one batch
    ///
    /// `positions` usually holds the departing chapter's position followed
    /// by the target chapter's starting position.
    pub fn switch_chapter(
        &self,
        book: &str,
        index: usize,
        positions: &[(&str, u64)],
    ) -> StoreResult<()> {
        let mut batch = self.batch(book);
        for (chapter, position_ms) in positions {
            batch.set(chapter, *position_ms);
        }
        let mut ops = batch.into_ops();
        ops.push(KvOp::set(keys::chapter_index(book), int_value(index as u64)));
        trace!("Chapter switch for {} to {} ({} ops)", book, index, ops.len());
        self.store.apply(ops)
    }

    /// Names of the chapters of `book` that have a saved position
    pub fn saved_chapters(&self, book: &str) -> BTreeSet<String> {
        self.store
            .get_set(&keys::positions_index(book))
            .unwrap_or_default()
    }

    /// Operations deleting every position and the pointer of `book`
    pub fn remove_book_ops(&self, book: &str) -> StoreResult<Vec<KvOp>> {
        let chapters = self.store.get_set(&keys::positions_index(book))?;
        let mut ops: Vec<KvOp> = chapters
            .iter()
            .map(|chapter| KvOp::remove(keys::position(book, chapter)))
            .collect();
        ops.push(KvOp::remove(keys::positions_index(book)));
        ops.push(KvOp::remove(keys::chapter_index(book)));
        Ok(ops)
    }

    fn batch(&self, book: &str) -> PositionBatch {
        let index = match self.store.get_set(&keys::positions_index(book)) {
            Ok(index) => index,
            Err(e) => {
                warn!("Could not read position index of {}: {}", book, e);
                BTreeSet::new()
            }
        };
        PositionBatch {
            book: book.to_string(),
            before: index.clone(),
            index,
            ops: Vec::new(),
        }
    }
}

fn int_value(value: u64) -> PrefValue {
    PrefValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
}

/// Position writes for one book, keeping the `positions_<book>` index in step
struct PositionBatch {
    book: String,
    before: BTreeSet<String>,
    index: BTreeSet<String>,
    ops: Vec<KvOp>,
}

impl PositionBatch {
    fn set(&mut self, chapter: &str, position_ms: u64) {
        self.ops.push(KvOp::set(
            keys::position(&self.book, chapter),
            int_value(position_ms),
        ));
        self.index.insert(chapter.to_string());
    }

    fn clear(&mut self, chapter: &str) {
        self.ops.push(KvOp::remove(keys::position(&self.book, chapter)));
        self.index.remove(chapter);
    }

    fn into_ops(mut self) -> Vec<KvOp> {
        if self.index != self.before {
            let key = keys::positions_index(&self.book);
            if self.index.is_empty() {
                self.ops.push(KvOp::remove(key));
            } else {
                self.ops.push(KvOp::set(key, PrefValue::TextSet(self.index)));
            }
        }
        self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, PositionStore) {
        let kv = Arc::new(MemoryStore::new());
        (kv.clone(), PositionStore::new(kv))
    }

    #[test]
    fn test_index_tracks_sets_and_clears() {
        let (kv, positions) = setup();
        positions.set("Dune", "ch1", 10).unwrap();
        positions.set("Dune", "ch2", 20).unwrap();
        assert_eq!(positions.saved_chapters("Dune").len(), 2);

        positions.clear("Dune", "ch1").unwrap();
        positions.clear("Dune", "ch2").unwrap();
        assert!(positions.saved_chapters("Dune").is_empty());
        assert!(kv.snapshot().is_empty());
    }

    #[test]
    fn test_wrong_type_reads_default() {
        let (kv, positions) = setup();
        kv.set("position_Dune_ch1", PrefValue::Text("oops".to_string()))
            .unwrap();
        kv.set("chapter_Dune", PrefValue::Int(-3)).unwrap();
        assert_eq!(positions.get("Dune", "ch1"), 0);
        assert_eq!(positions.chapter_index("Dune"), 0);
    }

    #[test]
    fn test_unavailable_store_reads_default() {
        let (kv, positions) = setup();
        positions.set("Dune", "ch1", 5_000).unwrap();
        kv.set_unavailable(true);
        assert_eq!(positions.get("Dune", "ch1"), 0);
        assert!(positions.set("Dune", "ch1", 6_000).is_err());
    }

    #[test]
    fn test_switch_chapter_single_batch() {
        let (kv, positions) = setup();
        positions
            .switch_chapter("Dune", 1, &[("ch1", 42_000), ("ch2", 0)])
            .unwrap();

        let snapshot = kv.snapshot();
        assert_eq!(snapshot.get("chapter_Dune"), Some(&PrefValue::Int(1)));
        assert_eq!(snapshot.get("position_Dune_ch1"), Some(&PrefValue::Int(42_000)));
        assert_eq!(snapshot.get("position_Dune_ch2"), Some(&PrefValue::Int(0)));
    }

    #[test]
    fn test_remove_book_ops_exact() {
        let (kv, positions) = setup();
        positions.set("Dune", "ch1", 1).unwrap();
        positions.set("Dune_Messiah", "ch1", 2).unwrap();
        positions.set_chapter_index("Dune", 3).unwrap();

        let ops = positions.remove_book_ops("Dune").unwrap();
        kv.apply(ops).unwrap();

        assert_eq!(positions.get("Dune", "ch1"), 0);
        assert_eq!(positions.chapter_index("Dune"), 0);
        assert_eq!(positions.get("Dune_Messiah", "ch1"), 2);
    }
}
