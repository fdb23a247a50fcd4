// FILE: crates/library/src/memory.rs

use crate::error::{LibraryError, Result};
use crate::index::{ChapterFile, LibraryIndex};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default)]
struct MemoryBook {
    name: String,
    files: Vec<String>,
    cover: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    books: Vec<MemoryBook>,
    revoked: bool,
}

/// Library index held in memory
///
/// Listing order is insertion order, which makes tie-breaking in the chapter
/// sort observable. Paths are synthesised as `root/book/file`.
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    state: RwLock<MemoryState>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a book with the given file names
    pub fn with_book(self, name: &str, files: &[&str]) -> Self {
        self.add_book(name, files);
        self
    }

    pub fn add_book(&self, name: &str, files: &[&str]) {
        let mut state = self.write();
        state.books.retain(|book| book.name != name);
        state.books.push(MemoryBook {
            name: name.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
            cover: None,
        });
    }

    /// Marks a file of the book as its cover (it is also listed as a file)
    pub fn set_cover(&self, book: &str, file_name: &str) {
        let mut state = self.write();
        if let Some(entry) = state.books.iter_mut().find(|b| b.name == book) {
            if !entry.files.iter().any(|f| f == file_name) {
                entry.files.push(file_name.to_string());
            }
            entry.cover = Some(file_name.to_string());
        }
    }

    pub fn remove_book(&self, name: &str) {
        self.write().books.retain(|book| book.name != name);
    }

    /// Simulates a revoked folder permission: every listing fails
    pub fn set_revoked(&self, revoked: bool) {
        self.write().revoked = revoked;
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn find_book(&self, root: &Path, book: &str) -> Result<MemoryBook> {
        let state = self.read();
        if state.revoked {
            return Err(LibraryError::PermissionDenied(root.to_path_buf()));
        }
        state
            .books
            .iter()
            .find(|b| b.name == book)
            .cloned()
            .ok_or_else(|| LibraryError::NotFound(root.join(book)))
    }
}

impl LibraryIndex for InMemoryLibrary {
    fn list_books(&self, root: &Path) -> Result<Vec<String>> {
        let state = self.read();
        if state.revoked {
            return Err(LibraryError::PermissionDenied(root.to_path_buf()));
        }
        Ok(state.books.iter().map(|b| b.name.clone()).collect())
    }

    fn list_chapter_files(&self, root: &Path, book: &str) -> Result<Vec<ChapterFile>> {
        let entry = self.find_book(root, book)?;
        let dir = root.join(book);
        Ok(entry
            .files
            .iter()
            .map(|name| ChapterFile::new(dir.join(name), name.clone()))
            .collect())
    }

    fn resolve_cover_file(&self, root: &Path, book: &str) -> Result<Option<PathBuf>> {
        let entry = self.find_book(root, book)?;
        Ok(entry.cover.map(|name| root.join(book).join(name)))
    }
}
