// FILE: crates/session/tests/shelf_tests.rs

use audiofolio_core::{Bookmark, Timestamp};
use audiofolio_library::{ChapterCatalog, FsLibraryIndex, InMemoryLibrary};
use audiofolio_session::Shelf;
use audiofolio_store::{KeyValueStore, MemoryStore, Stores};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn shelf(library: Arc<InMemoryLibrary>) -> (Arc<MemoryStore>, Shelf) {
    let kv = Arc::new(MemoryStore::new());
    let catalog = ChapterCatalog::new(library, "/books");
    (kv.clone(), Shelf::new(catalog, Stores::new(kv)))
}

#[test]
fn test_recent_reconciles_against_library() {
    let library = Arc::new(
        InMemoryLibrary::new()
            .with_book("A", &["1.mp3"])
            .with_book("B", &["1.mp3"]),
    );
    let (kv, shelf) = shelf(library.clone());
    let stores = shelf.stores().clone();
    for book in ["A", "B"] {
        stores.recent.record_opened(book, None).unwrap();
        stores.positions.set(book, "1", 1_000).unwrap();
        stores
            .bookmarks
            .add(&Bookmark::new(book, "1", 0, 500, Timestamp::from_millis(1)))
            .unwrap();
    }

    library.remove_book("B");
    let recent: Vec<String> = shelf.recent().unwrap().into_iter().map(|e| e.book).collect();

    assert_eq!(recent, vec!["A".to_string()]);
    assert!(kv
        .keys()
        .unwrap()
        .iter()
        .all(|k| !k.ends_with("_B") && !k.contains("_B_")));
    assert!(shelf.bookmarks().iter().all(|b| b.book == "A"));
}

#[test]
fn test_revoked_root_empties_recent() {
    let library = Arc::new(InMemoryLibrary::new().with_book("A", &["1.mp3"]));
    let (_kv, shelf) = shelf(library.clone());
    shelf.stores().recent.record_opened("A", None).unwrap();

    library.set_revoked(true);
    assert!(shelf.recent().unwrap().is_empty());
    assert!(!shelf.stores().recent.contains("A"));
}

#[test]
fn test_chapter_listing_marks_current_and_saved() {
    let library = Arc::new(InMemoryLibrary::new().with_book("Dune", &["02_b.mp3", "01_a.mp3"]));
    let (_kv, shelf) = shelf(library);
    shelf.stores().positions.set("Dune", "b", 7_000).unwrap();
    shelf.stores().positions.set_chapter_index("Dune", 1).unwrap();

    let listing = shelf.chapters("Dune");
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].chapter.display_name, "a");
    assert!(!listing[0].is_current);
    assert_eq!(listing[1].saved_position_ms, 7_000);
    assert!(listing[1].is_current);
}

#[test]
fn test_bookmarks_newest_first_and_forget() {
    let library = Arc::new(InMemoryLibrary::new().with_book("Dune", &["1.mp3"]));
    let (_kv, shelf) = shelf(library);
    let stores = shelf.stores().clone();
    stores.recent.record_opened("Dune", None).unwrap();
    for ts in [10, 30, 20] {
        stores
            .bookmarks
            .add(&Bookmark::new("Dune", "1", 0, ts as u64, Timestamp::from_millis(ts)))
            .unwrap();
    }

    let order: Vec<i64> = shelf
        .bookmarks()
        .iter()
        .map(|b| b.timestamp.as_millis())
        .collect();
    assert_eq!(order, vec![30, 20, 10]);

    shelf.forget("Dune").unwrap();
    assert!(shelf.bookmarks().is_empty());
    assert!(shelf.recent().unwrap().is_empty());
}

#[test]
fn test_set_root_lists_books_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let book_dir = temp_dir.path().join("Dune");
    fs::create_dir(&book_dir).unwrap();
    fs::write(book_dir.join("01.mp3"), b"x").unwrap();
    fs::write(book_dir.join("Cover.JPG"), b"x").unwrap();

    let kv = Arc::new(MemoryStore::new());
    let stores = Stores::new(kv);
    let catalog = ChapterCatalog::new(Arc::new(FsLibraryIndex::new()), "/nowhere");
    let mut shelf = Shelf::new(catalog, stores.clone());

    shelf.set_root(temp_dir.path()).unwrap();
    assert_eq!(stores.preferences.library_root().as_deref(), Some(temp_dir.path()));
    assert!(stores.preferences.has_selected_folder());

    let books = shelf.books().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].name, "Dune");
    assert!(books[0].has_cover());
}
