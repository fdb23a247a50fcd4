//! Selection pointers, the library root and the chapter-jump handoff

use crate::error::StoreResult;
use crate::keys;
use crate::kv::{KeyValueStore, KvOp, PrefValue};
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    default_root: Option<PathBuf>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            default_root: None,
        }
    }

    /// Root returned by `library_root` when none has been selected
    pub fn with_default_root(mut self, root: Option<PathBuf>) -> Self {
        self.default_root = root;
        self
    }

    fn text(&self, key: &str) -> Option<String> {
        self.store.get_text(key).unwrap_or_else(|e| {
            warn!("Could not read {}: {}", key, e);
            None
        })
    }

    pub fn library_root(&self) -> Option<PathBuf> {
        self.text(keys::AUDIOBOOK_DIR)
            .map(PathBuf::from)
            .or_else(|| self.default_root.clone())
    }

    pub fn has_selected_folder(&self) -> bool {
        matches!(self.store.get_int(keys::HAS_SELECTED_FOLDER), Ok(Some(1)))
    }

    pub fn set_library_root(&self, root: &Path) -> StoreResult<()> {
        self.store.apply(vec![
            KvOp::set(
                keys::AUDIOBOOK_DIR,
                PrefValue::Text(root.to_string_lossy().into_owned()),
            ),
            KvOp::set(keys::HAS_SELECTED_FOLDER, PrefValue::Int(1)),
        ])
    }

    pub fn selected_book(&self) -> Option<String> {
        self.text(keys::SELECTED_BOOK)
    }

    pub fn selected_book_cover(&self) -> Option<String> {
        self.text(keys::SELECTED_BOOK_COVER)
    }

    /// Stores the active book and its cover together
    pub fn set_selected_book(&self, book: &str, cover: Option<&str>) -> StoreResult<()> {
        let cover_op = match cover {
            Some(cover) => KvOp::set(keys::SELECTED_BOOK_COVER, PrefValue::Text(cover.into())),
            None => KvOp::remove(keys::SELECTED_BOOK_COVER),
        };
        self.store.apply(vec![
            KvOp::set(keys::SELECTED_BOOK, PrefValue::Text(book.to_string())),
            cover_op,
        ])
    }

    /// Leaves a chapter index for the session to pick up
    pub fn request_chapter(&self, index: usize) -> StoreResult<()> {
        self.store.set(
            keys::SELECTED_CHAPTER_INDEX,
            PrefValue::Int(i64::try_from(index).unwrap_or(i64::MAX)),
        )
    }

    /// Reads and clears the pending chapter request
    pub fn take_chapter_request(&self) -> Option<usize> {
        let index = match self.store.get_int(keys::SELECTED_CHAPTER_INDEX) {
            Ok(Some(index)) => usize::try_from(index).ok(),
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read chapter request: {}", e);
                return None;
            }
        };
        if let Err(e) = self.store.remove(keys::SELECTED_CHAPTER_INDEX) {
            warn!("Could not clear chapter request: {}", e);
        }
        index
    }
}
