// FILE: crates/session/src/shelf.rs

use audiofolio_core::{Book, Bookmark, Chapter, RecentEntry, Result};
use audiofolio_library::ChapterCatalog;
use audiofolio_store::Stores;
use log::{info, warn};
use std::path::Path;

/// A chapter together with what the store remembers about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterListing {
    pub chapter: Chapter,
    pub saved_position_ms: u64,
    pub is_current: bool,
}

/// Browsing side of the library: books, recents and bookmarks
#[derive(Clone)]
pub struct Shelf {
    catalog: ChapterCatalog,
    stores: Stores,
}

impl Shelf {
    pub fn new(catalog: ChapterCatalog, stores: Stores) -> Self {
        Self { catalog, stores }
    }

    pub fn root(&self) -> &Path {
        self.catalog.root()
    }

    /// Points the shelf at a new library folder and remembers it
    pub fn set_root(&mut self, root: &Path) -> Result<()> {
        self.stores.preferences.set_library_root(root)?;
        self.catalog.set_root(root);
        info!("Library root set to {}", root.display());
        Ok(())
    }

    pub fn books(&self) -> Result<Vec<Book>> {
        Ok(self.catalog.list_books()?)
    }

    pub fn chapters(&self, book: &str) -> Vec<ChapterListing> {
        let current = self.stores.positions.chapter_index(book);
        self.catalog
            .load_chapters(book)
            .into_iter()
            .map(|chapter| ChapterListing {
                saved_position_ms: self.stores.positions.get(book, &chapter.display_name),
                is_current: chapter.index == current,
                chapter,
            })
            .collect()
    }

    /// Recent books, after dropping the ones gone from the library
    ///
    /// A missing or revoked root counts as an empty library. Other listing
    /// failures leave the recent list untouched.
    pub fn recent(&self) -> Result<Vec<RecentEntry>> {
        match self.catalog.index().list_books(self.catalog.root()) {
            Ok(books) => {
                self.stores.recent.reconcile(&books)?;
            }
            Err(e) if e.is_not_found() => {
                warn!("Library root unavailable: {}", e);
                self.stores.recent.reconcile::<String>(&[])?;
            }
            Err(e) => warn!("Skipping reconciliation: {}", e),
        }
        Ok(self.stores.recent.list())
    }

    /// Removes a book from the recents together with everything saved for it
    pub fn forget(&self, book: &str) -> Result<()> {
        self.stores.recent.remove(book)?;
        Ok(())
    }

    /// All bookmarks, newest first
    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.stores.bookmarks.list_newest_first()
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }
}
