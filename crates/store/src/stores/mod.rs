//! Typed views over the key-value store

mod bookmarks;
mod positions;
mod preferences;
mod recent;

pub use bookmarks::BookmarkStore;
pub use positions::PositionStore;
pub use preferences::Preferences;
pub use recent::RecentStore;

use crate::kv::KeyValueStore;
use std::path::PathBuf;
use std::sync::Arc;

/// All typed stores over one backing store
#[derive(Clone)]
pub struct Stores {
    pub positions: PositionStore,
    pub bookmarks: BookmarkStore,
    pub recent: RecentStore,
    pub preferences: Preferences,
}

impl Stores {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            positions: PositionStore::new(store.clone()),
            bookmarks: BookmarkStore::new(store.clone()),
            recent: RecentStore::new(store.clone()),
            preferences: Preferences::new(store),
        }
    }

    pub fn with_default_root(mut self, root: Option<PathBuf>) -> Self {
        self.preferences = self.preferences.with_default_root(root);
        self
    }
}
