// FILE: crates/library/src/index.rs

use crate::error::Result;
use std::path::{Path, PathBuf};

/// A direct child file of a book folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFile {
    /// Reference handed to the decoder
    pub file: PathBuf,
    pub file_name: String,
}

impl ChapterFile {
    pub fn new(file: PathBuf, file_name: impl Into<String>) -> Self {
        Self {
            file,
            file_name: file_name.into(),
        }
    }

    /// Lowercased extension, if the name has one after a non-leading dot
    pub fn extension(&self) -> Option<String> {
        match self.file_name.rfind('.') {
            Some(dot) if dot > 0 && dot + 1 < self.file_name.len() => {
                Some(self.file_name[dot + 1..].to_ascii_lowercase())
            }
            _ => None,
        }
    }
}

/// The file-system surface the playback core depends on
///
/// Books are the directories directly under the library root; chapters are
/// the files directly inside a book directory. Implementations return a
/// `NotFound` error for a missing root or book.
pub trait LibraryIndex: Send + Sync {
    /// Lists book folder names under `root`
    fn list_books(&self, root: &Path) -> Result<Vec<String>>;

    /// Lists the files directly inside `root/book`, in listing order
    fn list_chapter_files(&self, root: &Path, book: &str) -> Result<Vec<ChapterFile>>;

    /// Finds the cover file of a book, matching the name case-insensitively
    fn resolve_cover_file(&self, root: &Path, book: &str) -> Result<Option<PathBuf>>;
}
