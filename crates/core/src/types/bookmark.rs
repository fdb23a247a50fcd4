//! Bookmark domain model and its persisted record format

use crate::error::AppError;
use crate::types::{format_clock, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator used by the persisted bookmark record
pub const RECORD_SEPARATOR: char = '|';

const RECORD_FIELDS: usize = 5;

/// A user-captured listening position. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bookmark {
    pub book: String,
    /// Display name of the chapter at capture time
    pub chapter: String,
    pub chapter_index: usize,
    pub position_ms: u64,
    pub timestamp: Timestamp,
}

impl Bookmark {
    pub fn new(
        book: impl Into<String>,
        chapter: impl Into<String>,
        chapter_index: usize,
        position_ms: u64,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            book: book.into(),
            chapter: chapter.into(),
            chapter_index,
            position_ms,
            timestamp,
        }
    }

    /// Returns true if the text fields can be written as a record
    pub fn is_encodable(&self) -> bool {
        !self.book.contains(RECORD_SEPARATOR) && !self.chapter.contains(RECORD_SEPARATOR)
    }

    /// Encodes the bookmark as `book|chapter|chapterIndex|position|timestamp`
    pub fn to_record(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}{sep}{}{sep}{}",
            self.book,
            self.chapter,
            self.chapter_index,
            self.position_ms,
            self.timestamp.as_millis(),
            sep = RECORD_SEPARATOR
        )
    }

    /// Two-line label: the book, then the chapter and `mm:ss` position
    pub fn label(&self) -> String {
        format!(
            "{}\n{} - {}",
            self.book,
            self.chapter,
            format_clock(self.position_ms)
        )
    }
}

impl fmt::Display for Bookmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} @ {}",
            self.book,
            self.chapter,
            format_clock(self.position_ms)
        )
    }
}

impl FromStr for Bookmark {
    type Err = AppError;

    fn from_str(record: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: String| AppError::MalformedRecord {
            record: record.to_string(),
            reason,
        };

        let parts: Vec<&str> = record.split(RECORD_SEPARATOR).collect();
        if parts.len() != RECORD_FIELDS {
            return Err(malformed(format!(
                "expected {} fields, found {}",
                RECORD_FIELDS,
                parts.len()
            )));
        }

        let chapter_index = parts[2]
            .parse::<usize>()
            .map_err(|e| malformed(format!("chapter index: {}", e)))?;
        let position_ms = parts[3]
            .parse::<u64>()
            .map_err(|e| malformed(format!("position: {}", e)))?;
        let timestamp = parts[4]
            .parse::<i64>()
            .map_err(|e| malformed(format!("timestamp: {}", e)))?;

        Ok(Self {
            book: parts[0].to_string(),
            chapter: parts[1].to_string(),
            chapter_index,
            position_ms,
            timestamp: Timestamp::from_millis(timestamp),
        })
    }
}
