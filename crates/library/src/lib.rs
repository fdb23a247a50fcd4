//! Audiofolio library access
//!
//! A library is a root folder with one sub-folder per book; each book folder
//! holds its chapter audio files and optionally a cover image. This crate
//! lists that structure ([`LibraryIndex`]) and turns a book into an ordered
//! chapter list ([`ChapterCatalog`]).

pub mod catalog;
pub mod error;
pub mod fs;
pub mod index;
pub mod memory;

pub use catalog::{natural_sort_key, ChapterCatalog};
pub use error::{LibraryError, LibraryResult};
pub use fs::FsLibraryIndex;
pub use index::{ChapterFile, LibraryIndex};
pub use memory::InMemoryLibrary;
