// FILE: crates/library/src/catalog.rs

use crate::error::LibraryResult;
use crate::index::{ChapterFile, LibraryIndex};
use audiofolio_config::LibraryConfig;
use audiofolio_core::{Book, Chapter};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_EXTENSIONS: &[&str] = &["mp3", "m4a"];

/// Sort key for chapter files: the first run of digits in the file stem.
///
/// Numbered files come first in ascending numeric order; files without any
/// digits sort after them. Runs too long for a `u64` saturate.
pub fn natural_sort_key(file_name: &str) -> (u8, u64) {
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };

    let digits: String = stem
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return (1, 0);
    }

    let value = digits.bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    });
    (0, value)
}

/// Resolves book names into naturally ordered chapters
#[derive(Clone)]
pub struct ChapterCatalog {
    index: Arc<dyn LibraryIndex>,
    root: PathBuf,
    extensions: Vec<String>,
}

impl ChapterCatalog {
    pub fn new(index: Arc<dyn LibraryIndex>, root: impl Into<PathBuf>) -> Self {
        Self {
            index,
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn from_config(
        index: Arc<dyn LibraryIndex>,
        root: impl Into<PathBuf>,
        config: &LibraryConfig,
    ) -> Self {
        Self::new(index, root).with_extensions(config.supported_extensions.clone())
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.to_ascii_lowercase())
            .collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        self.root = root.into();
    }

    pub fn index(&self) -> &Arc<dyn LibraryIndex> {
        &self.index
    }

    fn is_supported(&self, file: &ChapterFile) -> bool {
        file.extension()
            .map(|ext| self.extensions.contains(&ext))
            .unwrap_or(false)
    }

    /// Loads the ordered chapters of a book
    ///
    /// A missing book or a failed listing gives an empty list.
    pub fn load_chapters(&self, book: &str) -> Vec<Chapter> {
        let files = match self.index.list_chapter_files(&self.root, book) {
            Ok(files) => files,
            Err(e) => {
                warn!("Could not list chapters of '{}': {}", book, e);
                return Vec::new();
            }
        };

        let mut files: Vec<ChapterFile> =
            files.into_iter().filter(|f| self.is_supported(f)).collect();
        // Vec::sort_by_key is stable, so equal keys keep listing order
        files.sort_by_key(|f| natural_sort_key(&f.file_name));

        let chapters: Vec<Chapter> = files
            .into_iter()
            .enumerate()
            .map(|(index, f)| Chapter::new(book, index, f.file, &f.file_name))
            .collect();

        debug!("Loaded {} chapters for '{}'", chapters.len(), book);
        chapters
    }

    /// Lists the books under the root together with their covers
    pub fn list_books(&self) -> LibraryResult<Vec<Book>> {
        let names = self.index.list_books(&self.root)?;
        Ok(names
            .into_iter()
            .map(|name| {
                let cover = self.cover_for(&name);
                Book::new(name).with_cover(cover)
            })
            .collect())
    }

    pub fn cover_for(&self, book: &str) -> Option<PathBuf> {
        match self.index.resolve_cover_file(&self.root, book) {
            Ok(cover) => cover,
            Err(e) => {
                debug!("No cover for '{}': {}", book, e);
                None
            }
        }
    }
}
