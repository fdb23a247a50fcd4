//! Audiofolio core: domain records and the shared error type.

pub mod error;
pub mod types;

pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use types::{
    display_name_for, format_clock, Book, Bookmark, Chapter, PlaybackState, RecentEntry,
    SessionState, Timestamp, RECORD_SEPARATOR,
};
