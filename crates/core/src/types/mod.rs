//! Domain types for Audiofolio
//!
//! - `book`: Book, Chapter and RecentEntry, plus chapter title derivation
//! - `bookmark`: User bookmarks and their persisted record format
//! - `playback`: Session states and playback snapshots
//! - `common`: Timestamps and time formatting

mod book;
mod bookmark;
mod common;
mod playback;

pub use book::{display_name_for, Book, Chapter, RecentEntry};
pub use bookmark::{Bookmark, RECORD_SEPARATOR};
pub use common::{format_clock, Timestamp};
pub use playback::{PlaybackState, SessionState};
