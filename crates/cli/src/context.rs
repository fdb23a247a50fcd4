// FILE: crates/cli/src/context.rs

use anyhow::{anyhow, Context, Result};
use audiofolio_config::Config;
use audiofolio_library::{ChapterCatalog, FsLibraryIndex, LibraryIndex};
use audiofolio_session::{SessionConfig, Shelf};
use audiofolio_store::{FileStore, Stores};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a command needs: configuration and the opened state file
pub struct AppContext {
    pub config: Config,
    pub stores: Stores,
    index: Arc<dyn LibraryIndex>,
}

impl AppContext {
    pub fn open(config: Config, state_path: &Path) -> Result<Self> {
        let store = FileStore::open(state_path)
            .with_context(|| format!("Failed to open state file {}", state_path.display()))?;
        let stores =
            Stores::new(Arc::new(store)).with_default_root(config.library.default_root.clone());
        let index = Arc::new(
            FsLibraryIndex::new().with_cover_file_name(config.library.cover_file_name.clone()),
        );

        Ok(Self {
            config,
            stores,
            index,
        })
    }

    pub fn library_root(&self) -> Result<PathBuf> {
        self.stores.preferences.library_root().ok_or_else(|| {
            anyhow!("No library folder selected. Run `audiofolio root <DIR>` first.")
        })
    }

    pub fn catalog_at(&self, root: &Path) -> ChapterCatalog {
        ChapterCatalog::from_config(self.index.clone(), root, &self.config.library)
    }

    pub fn catalog(&self) -> Result<ChapterCatalog> {
        Ok(self.catalog_at(&self.library_root()?))
    }

    pub fn shelf(&self) -> Result<Shelf> {
        Ok(Shelf::new(self.catalog()?, self.stores.clone()))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::from(&self.config.player)
    }
}
