//! Bookmark persistence as a set of pipe-delimited records

use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::kv::{KeyValueStore, KvOp, PrefValue};
use audiofolio_core::{Bookmark, RECORD_SEPARATOR};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct BookmarkStore {
    store: Arc<dyn KeyValueStore>,
}

impl BookmarkStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Adds a bookmark
    ///
    /// Records live in a set, so only a bookmark identical in every field
    /// (timestamp included) collapses with an existing one.
    pub fn add(&self, bookmark: &Bookmark) -> StoreResult<()> {
        if bookmark.book.contains(RECORD_SEPARATOR) {
            return Err(StoreError::Unencodable {
                field: "book",
                value: bookmark.book.clone(),
            });
        }
        if bookmark.chapter.contains(RECORD_SEPARATOR) {
            return Err(StoreError::Unencodable {
                field: "chapter",
                value: bookmark.chapter.clone(),
            });
        }

        let mut records = self.store.get_set(keys::ALL_BOOKMARKS)?;
        records.insert(bookmark.to_record());
        self.store
            .set(keys::ALL_BOOKMARKS, PrefValue::TextSet(records))?;
        debug!("Bookmark added: {}", bookmark);
        Ok(())
    }

    /// All well-formed bookmarks; malformed records are skipped
    pub fn list(&self) -> Vec<Bookmark> {
        let records = match self.store.get_set(keys::ALL_BOOKMARKS) {
            Ok(records) => records,
            Err(e) => {
                warn!("Could not read bookmarks: {}", e);
                return Vec::new();
            }
        };

        records
            .iter()
            .filter_map(|record| match record.parse::<Bookmark>() {
                Ok(bookmark) => Some(bookmark),
                Err(e) => {
                    debug!("Dropping bookmark record: {}", e);
                    None
                }
            })
            .collect()
    }

    /// All bookmarks, newest first
    pub fn list_newest_first(&self) -> Vec<Bookmark> {
        let mut bookmarks = self.list();
        bookmarks.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        bookmarks
    }

    pub fn remove_all_for_book(&self, book: &str) -> StoreResult<()> {
        let ops = self.remove_book_ops(book)?;
        self.store.apply(ops)
    }

    /// Operations dropping every record of `book`
    ///
    /// Records that do not parse are left alone.
    pub fn remove_book_ops(&self, book: &str) -> StoreResult<Vec<KvOp>> {
        let records = self.store.get_set(keys::ALL_BOOKMARKS)?;
        let kept: BTreeSet<String> = records
            .iter()
            .filter(|record| match record.parse::<Bookmark>() {
                Ok(bookmark) => bookmark.book != book,
                Err(_) => true,
            })
            .cloned()
            .collect();

        if kept.len() == records.len() {
            return Ok(Vec::new());
        }
        Ok(vec![KvOp::set(keys::ALL_BOOKMARKS, PrefValue::TextSet(kept))])
    }
}
