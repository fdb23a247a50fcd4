// FILE: crates/library/src/fs.rs

use crate::error::{LibraryError, Result};
use crate::index::{ChapterFile, LibraryIndex};
use audiofolio_config::DEFAULT_COVER_FILE_NAME;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Library index backed by the local file system
#[derive(Debug, Clone)]
pub struct FsLibraryIndex {
    cover_file_name: String,
    follow_symlinks: bool,
}

impl Default for FsLibraryIndex {
    fn default() -> Self {
        Self {
            cover_file_name: DEFAULT_COVER_FILE_NAME.to_string(),
            follow_symlinks: true,
        }
    }
}

impl FsLibraryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cover_file_name(mut self, name: impl Into<String>) -> Self {
        self.cover_file_name = name.into();
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Direct children of `dir`, sorted by file name, hidden entries skipped
    fn children(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let metadata = std::fs::metadata(dir)
            .map_err(|e| LibraryError::from_io(dir.to_path_buf(), e))?;
        if !metadata.is_dir() {
            return Err(LibraryError::NotADirectory(dir.to_path_buf()));
        }

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name();

        let mut entries = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    // A single unreadable child does not hide the rest
                    warn!("Error listing {}: {}", dir.display(), e);
                    continue;
                }
            };
            if is_hidden(&entry) {
                continue;
            }
            entries.push(entry);
        }
        Ok(entries)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn entry_name(entry: &DirEntry) -> Option<String> {
    match entry.file_name().to_str() {
        Some(name) => Some(name.to_string()),
        None => {
            debug!("Skipping non UTF-8 name: {}", entry.path().display());
            None
        }
    }
}

impl LibraryIndex for FsLibraryIndex {
    fn list_books(&self, root: &Path) -> Result<Vec<String>> {
        let books: Vec<String> = self
            .children(root)?
            .iter()
            .filter(|entry| entry.file_type().is_dir())
            .filter_map(entry_name)
            .collect();

        debug!("Found {} books under {}", books.len(), root.display());
        Ok(books)
    }

    fn list_chapter_files(&self, root: &Path, book: &str) -> Result<Vec<ChapterFile>> {
        let dir = root.join(book);
        let files = self
            .children(&dir)?
            .into_iter()
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let name = entry_name(&entry)?;
                Some(ChapterFile::new(entry.into_path(), name))
            })
            .collect();
        Ok(files)
    }

    fn resolve_cover_file(&self, root: &Path, book: &str) -> Result<Option<PathBuf>> {
        let dir = root.join(book);
        let cover = self
            .children(&dir)?
            .into_iter()
            .filter(|entry| entry.file_type().is_file())
            .find(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| name.eq_ignore_ascii_case(&self.cover_file_name))
                    .unwrap_or(false)
            })
            .map(DirEntry::into_path);
        Ok(cover)
    }
}
