//! Persisted key names

pub const AUDIOBOOK_DIR: &str = "audiobook_dir";
pub const HAS_SELECTED_FOLDER: &str = "has_selected_folder";
pub const SELECTED_BOOK: &str = "selected_book";
pub const SELECTED_BOOK_COVER: &str = "selected_book_cover";
pub const RECENT_BOOKS: &str = "recent_books";
pub const ALL_BOOKMARKS: &str = "all_bookmarks";
pub const SELECTED_CHAPTER_INDEX: &str = "selected_chapter_index";

pub fn recent_cover(book: &str) -> String {
    format!("recent_cover_{}", book)
}

/// Saved position of one chapter, keyed by its display name
pub fn position(book: &str, chapter: &str) -> String {
    format!("position_{}_{}", book, chapter)
}

/// Set of chapter names of `book` that have a `position` key
pub fn positions_index(book: &str) -> String {
    format!("positions_{}", book)
}

pub fn chapter_index(book: &str) -> String {
    format!("chapter_{}", book)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats() {
        assert_eq!(position("Dune", "ch1"), "position_Dune_ch1");
        assert_eq!(chapter_index("Dune"), "chapter_Dune");
        assert_eq!(recent_cover("Dune"), "recent_cover_Dune");
    }

    #[test]
    fn test_index_key_never_a_position_key() {
        assert_ne!(positions_index("Dune"), position("s", "Dune"));
        assert!(!positions_index("Dune").starts_with("position_"));
    }
}
