//! Book, chapter and recent-entry domain models

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Characters accepted between a leading chapter number and the title
const NUMERIC_PREFIX_DELIMITERS: &[char] = &['_', '-', ' ', '.'];

/// A folder under the library root containing chapter files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub name: String,
    pub cover: Option<PathBuf>,
}

impl Book {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cover: None,
        }
    }

    pub fn with_cover(mut self, cover: Option<PathBuf>) -> Self {
        self.cover = cover;
        self
    }

    pub fn has_cover(&self) -> bool {
        self.cover.is_some()
    }
}

/// One playable audio file within a book, at its position in the ordered catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub book: String,
    pub index: usize,
    pub file: PathBuf,
    pub display_name: String,
}

impl Chapter {
    /// Creates a chapter, deriving its display name from the file name
    pub fn new(book: impl Into<String>, index: usize, file: PathBuf, file_name: &str) -> Self {
        Self {
            book: book.into(),
            index,
            file,
            display_name: display_name_for(file_name),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file
    }
}

/// Derives the stable chapter title from a file name.
///
/// The extension is dropped, then a leading run of digits followed by a
/// delimiter (`_`, `-`, space or `.`) is stripped: `01_ch1.mp3` becomes
/// `ch1` and `02 - Arrakis.m4a` becomes `Arrakis`. A name that would become
/// empty keeps its stem, so `7.mp3` stays `7`.
pub fn display_name_for(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };

    let rest = stem.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == stem.len() || !rest.starts_with(NUMERIC_PREFIX_DELIMITERS) {
        return stem.to_string();
    }

    let title = rest.trim_start_matches(NUMERIC_PREFIX_DELIMITERS);
    if title.is_empty() {
        stem.to_string()
    } else {
        title.to_string()
    }
}

/// A recently opened book. Presence in the recent set is all that matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub book: String,
    pub cover: Option<String>,
}
