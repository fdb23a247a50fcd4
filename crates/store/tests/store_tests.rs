//! Integration tests for the typed stores

use audiofolio_core::{Bookmark, Timestamp, RECORD_SEPARATOR};
use audiofolio_store::{
    keys, FileStore, KeyValueStore, MemoryStore, PrefValue, StoreError, Stores,
};
use std::sync::Arc;
use tempfile::TempDir;

fn memory_stores() -> (Arc<MemoryStore>, Stores) {
    let kv = Arc::new(MemoryStore::new());
    (kv.clone(), Stores::new(kv))
}

fn bookmark(book: &str, chapter: &str, position_ms: u64, ts: i64) -> Bookmark {
    Bookmark::new(book, chapter, 0, position_ms, Timestamp::from_millis(ts))
}

#[test]
fn test_position_round_trip_and_clear() -> Result<(), StoreError> {
    let (_kv, stores) = memory_stores();

    assert_eq!(stores.positions.get("Dune", "ch1"), 0);

    stores.positions.set("Dune", "ch1", 123_456)?;
    assert_eq!(stores.positions.get("Dune", "ch1"), 123_456);

    stores.positions.set("Dune", "ch1", 7)?;
    assert_eq!(stores.positions.get("Dune", "ch1"), 7);

    stores.positions.clear("Dune", "ch1")?;
    assert_eq!(stores.positions.get("Dune", "ch1"), 0);
    stores.positions.clear("Dune", "ch1")?;
    assert_eq!(stores.positions.get("Dune", "ch1"), 0);

    Ok(())
}

#[test]
fn test_chapter_pointer_default_and_overwrite() -> Result<(), StoreError> {
    let (_kv, stores) = memory_stores();
    assert_eq!(stores.positions.chapter_index("Dune"), 0);
    stores.positions.set_chapter_index("Dune", 4)?;
    assert_eq!(stores.positions.chapter_index("Dune"), 4);
    Ok(())
}

#[test]
fn test_malformed_bookmarks_skipped() -> Result<(), StoreError> {
    let (kv, stores) = memory_stores();
    let records = [
        "Dune|ch1|0|1000|1",
        "Dune|ch1|0|1000",
        "Dune|ch1|zero|1000|1",
        "Dune|ch1|0|-5|1",
        "Emma|ch3|2|3000|2",
        "",
    ];
    kv.set(
        keys::ALL_BOOKMARKS,
        PrefValue::TextSet(records.iter().map(|r| r.to_string()).collect()),
    )?;

    let listed = stores.bookmarks.list();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|b| b.book == "Emma" && b.chapter_index == 2));
    Ok(())
}

#[test]
fn test_separator_in_names_is_rejected() -> Result<(), StoreError> {
    let (_kv, stores) = memory_stores();
    let book = format!("Dune{}Messiah", RECORD_SEPARATOR);
    let chapter = format!("ch{}1", RECORD_SEPARATOR);

    assert!(matches!(
        stores.bookmarks.add(&bookmark(&book, "ch1", 1_000, 1)),
        Err(StoreError::Unencodable { field: "book", .. })
    ));
    assert!(matches!(
        stores.bookmarks.add(&bookmark("Dune", &chapter, 1_000, 2)),
        Err(StoreError::Unencodable { field: "chapter", .. })
    ));
    assert!(stores.bookmarks.list().is_empty());

    stores.bookmarks.add(&bookmark("Dune", "ch1", 1_000, 3))?;
    assert_eq!(stores.bookmarks.list().len(), 1);
    Ok(())
}

#[test]
fn test_remove_cascades_fully() -> Result<(), StoreError> {
    let (kv, stores) = memory_stores();

    stores.recent.record_opened("Dune", Some("/books/Dune/cover.jpg"))?;
    stores.recent.record_opened("Emma", None)?;
    stores.preferences.set_selected_book("Dune", Some("/books/Dune/cover.jpg"))?;
    stores.positions.set("Dune", "ch1", 1_000)?;
    stores.positions.set("Dune", "ch2", 2_000)?;
    stores.positions.set_chapter_index("Dune", 1)?;
    stores.positions.set("Emma", "ch1", 9_000)?;
    stores.bookmarks.add(&bookmark("Dune", "ch1", 500, 1))?;
    stores.bookmarks.add(&bookmark("Emma", "ch1", 600, 2))?;

    stores.recent.remove("Dune")?;

    assert_eq!(stores.positions.get("Dune", "ch1"), 0);
    assert_eq!(stores.positions.get("Dune", "ch2"), 0);
    assert_eq!(stores.positions.chapter_index("Dune"), 0);
    assert!(stores.bookmarks.list().iter().all(|b| b.book != "Dune"));
    assert_eq!(stores.preferences.selected_book(), None);
    assert_eq!(stores.preferences.selected_book_cover(), None);
    assert!(!stores.recent.contains("Dune"));

    assert_eq!(stores.positions.get("Emma", "ch1"), 9_000);
    assert_eq!(stores.bookmarks.list().len(), 1);

    let leftover: Vec<String> = kv
        .keys()?
        .into_iter()
        .filter(|k| k.contains("Dune"))
        .collect();
    assert!(leftover.is_empty(), "leftover keys: {:?}", leftover);

    Ok(())
}

#[test]
fn test_remove_keeps_other_selected_book() -> Result<(), StoreError> {
    let (_kv, stores) = memory_stores();
    stores.recent.record_opened("Dune", None)?;
    stores.preferences.set_selected_book("Emma", None)?;

    stores.recent.remove("Dune")?;
    assert_eq!(stores.preferences.selected_book().as_deref(), Some("Emma"));
    Ok(())
}

#[test]
fn test_reconcile_removes_missing_books() -> Result<(), StoreError> {
    let (kv, stores) = memory_stores();
    for book in ["A", "B"] {
        stores.recent.record_opened(book, Some("cover.jpg"))?;
        stores.positions.set(book, "ch1", 1_000)?;
        stores.positions.set_chapter_index(book, 1)?;
        stores.bookmarks.add(&bookmark(book, "ch1", 1_000, 1))?;
    }

    let removed = stores.recent.reconcile(&["A"])?;
    assert_eq!(removed, vec!["B".to_string()]);

    let recent: Vec<String> = stores.recent.list().into_iter().map(|e| e.book).collect();
    assert_eq!(recent, vec!["A".to_string()]);

    let keys = kv.keys()?;
    assert!(keys.iter().all(|k| !k.ends_with("_B") && !k.contains("_B_")));
    assert!(stores.bookmarks.list().iter().all(|b| b.book == "A"));
    assert_eq!(stores.positions.get("A", "ch1"), 1_000);
    Ok(())
}

#[test]
fn test_prefix_sharing_books_removed_exactly() -> Result<(), StoreError> {
    let (_kv, stores) = memory_stores();
    stores.recent.record_opened("Dune", None)?;
    stores.recent.record_opened("Dune Messiah", None)?;
    stores.positions.set("Dune", "ch1", 1)?;
    stores.positions.set("Dune Messiah", "ch1", 2)?;

    stores.recent.remove("Dune")?;
    assert_eq!(stores.positions.get("Dune Messiah", "ch1"), 2);
    Ok(())
}

#[test]
fn test_file_store_keeps_state_across_restarts() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("state.json");

    {
        let stores = Stores::new(Arc::new(FileStore::open(&path)?));
        stores.positions.switch_chapter("Dune", 1, &[("ch1", 61_000), ("ch2", 0)])?;
        stores.bookmarks.add(&bookmark("Dune", "ch1", 30_000, 5))?;
        stores.recent.record_opened("Dune", None)?;
    }

    let stores = Stores::new(Arc::new(FileStore::open(&path)?));
    assert_eq!(stores.positions.chapter_index("Dune"), 1);
    assert_eq!(stores.positions.get("Dune", "ch1"), 61_000);
    assert_eq!(stores.bookmarks.list().len(), 1);
    assert!(stores.recent.contains("Dune"));
    Ok(())
}
