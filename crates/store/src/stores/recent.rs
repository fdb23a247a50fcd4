//! Recently opened books, removal cascade and reconciliation

use crate::error::StoreResult;
use crate::keys;
use crate::kv::{KeyValueStore, KvOp, PrefValue};
use crate::stores::{BookmarkStore, PositionStore};
use audiofolio_core::RecentEntry;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct RecentStore {
    store: Arc<dyn KeyValueStore>,
    positions: PositionStore,
    bookmarks: BookmarkStore,
}

impl RecentStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            positions: PositionStore::new(store.clone()),
            bookmarks: BookmarkStore::new(store.clone()),
            store,
        }
    }

    /// Adds the book, overwriting its cover (last cover wins)
    pub fn record_opened(&self, book: &str, cover: Option<&str>) -> StoreResult<()> {
        let mut books = self.store.get_set(keys::RECENT_BOOKS)?;
        books.insert(book.to_string());

        let cover_op = match cover {
            Some(cover) => KvOp::set(keys::recent_cover(book), PrefValue::Text(cover.into())),
            None => KvOp::remove(keys::recent_cover(book)),
        };
        self.store.apply(vec![
            KvOp::set(keys::RECENT_BOOKS, PrefValue::TextSet(books)),
            cover_op,
        ])
    }

    /// Recent books in name order
    pub fn list(&self) -> Vec<RecentEntry> {
        let books = match self.store.get_set(keys::RECENT_BOOKS) {
            Ok(books) => books,
            Err(e) => {
                warn!("Could not read recent books: {}", e);
                return Vec::new();
            }
        };

        books
            .into_iter()
            .map(|book| {
                let cover = self
                    .store
                    .get_text(&keys::recent_cover(&book))
                    .unwrap_or_default();
                RecentEntry { book, cover }
            })
            .collect()
    }

    pub fn contains(&self, book: &str) -> bool {
        self.store
            .get_set(keys::RECENT_BOOKS)
            .map(|books| books.contains(book))
            .unwrap_or(false)
    }

    /// Removes the book and everything persisted about it
    ///
    /// Positions, the chapter pointer, bookmarks and the selected-book pointer
    /// (when it names this book) go in the same batch as the recent entry.
    pub fn remove(&self, book: &str) -> StoreResult<()> {
        let mut ops = Vec::new();

        let mut books = self.store.get_set(keys::RECENT_BOOKS)?;
        if books.remove(book) {
            ops.push(KvOp::set(keys::RECENT_BOOKS, PrefValue::TextSet(books)));
        }
        ops.push(KvOp::remove(keys::recent_cover(book)));
        ops.extend(self.positions.remove_book_ops(book)?);
        ops.extend(self.bookmarks.remove_book_ops(book)?);

        if self.store.get_text(keys::SELECTED_BOOK)?.as_deref() == Some(book) {
            ops.push(KvOp::remove(keys::SELECTED_BOOK));
            ops.push(KvOp::remove(keys::SELECTED_BOOK_COVER));
        }

        debug!("Removing {} ({} ops)", book, ops.len());
        self.store.apply(ops)
    }

    /// Removes every recent book missing from `existing`
    ///
    /// Returns the removed book names.
    pub fn reconcile<S: AsRef<str>>(&self, existing: &[S]) -> StoreResult<Vec<String>> {
        let existing: HashSet<&str> = existing.iter().map(AsRef::as_ref).collect();
        let stale: Vec<String> = self
            .store
            .get_set(keys::RECENT_BOOKS)?
            .into_iter()
            .filter(|book| !existing.contains(book.as_str()))
            .collect();

        for book in &stale {
            info!("Book '{}' is gone from the library, forgetting it", book);
            self.remove(book)?;
        }
        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_record_opened_last_cover_wins() {
        let recent = RecentStore::new(Arc::new(MemoryStore::new()));
        recent.record_opened("Dune", Some("old.jpg")).unwrap();
        recent.record_opened("Dune", Some("new.jpg")).unwrap();

        let entries = recent.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].cover.as_deref(), Some("new.jpg"));
    }

    #[test]
    fn test_cover_cleared_when_missing() {
        let recent = RecentStore::new(Arc::new(MemoryStore::new()));
        recent.record_opened("Dune", Some("cover.jpg")).unwrap();
        recent.record_opened("Dune", None).unwrap();
        assert_eq!(recent.list()[0].cover, None);
    }

    #[test]
    fn test_reconcile_nothing_stale() {
        let recent = RecentStore::new(Arc::new(MemoryStore::new()));
        recent.record_opened("Dune", None).unwrap();
        assert!(recent.reconcile(&["Dune"]).unwrap().is_empty());
        assert!(recent.contains("Dune"));
    }
}
