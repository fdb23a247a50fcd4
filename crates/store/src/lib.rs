//! Audiofolio state persistence
//!
//! Everything the player remembers lives in one flat key-value store
//! ([`KeyValueStore`]): saved positions, chapter pointers, bookmarks, recent
//! books and selection pointers. [`MemoryStore`] backs tests, [`FileStore`]
//! keeps the map in a JSON file. The typed stores in [`stores`] are the only
//! code that knows the key layout.

pub mod error;
pub mod file;
pub mod keys;
pub mod kv;
pub mod memory;
pub mod stores;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use kv::{KeyValueStore, KvOp, PrefValue};
pub use memory::MemoryStore;
pub use stores::{BookmarkStore, PositionStore, Preferences, RecentStore, Stores};
