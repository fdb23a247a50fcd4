// FILE: crates/cli/src/commands.rs

use crate::context::AppContext;
use crate::player::{self, PlayRequest};
use anyhow::{bail, Context, Result};
use audiofolio_core::{format_clock, Book, Bookmark, RecentEntry};
use audiofolio_session::ChapterListing;
use console::style;
use std::path::Path;

/// Remember the library folder
pub fn set_root(ctx: &AppContext, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }
    let dir = dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", dir.display()))?;

    let mut shelf = audiofolio_session::Shelf::new(ctx.catalog_at(&dir), ctx.stores.clone());
    shelf.set_root(&dir).context("Failed to store library folder")?;

    let books = shelf.books().context("Failed to list books")?;
    println!(
        "{} Library folder set to {} ({} books)",
        style("✓").green().bold(),
        dir.display(),
        books.len()
    );
    Ok(())
}

/// List the books under the library folder
pub fn list_books(ctx: &AppContext) -> Result<()> {
    let shelf = ctx.shelf()?;
    let books = shelf.books().context("Failed to list books")?;

    if books.is_empty() {
        println!("No books found in {}", shelf.root().display());
        return Ok(());
    }

    println!("\n{} Books in Library", style(books.len()).bold().cyan());
    println!("{}", "=".repeat(60));
    for book in &books {
        println!("{}", book_line(book));
    }
    Ok(())
}

/// List the chapters of a book in playing order
pub fn list_chapters(ctx: &AppContext, book: &str) -> Result<()> {
    let listing = ctx.shelf()?.chapters(book);

    if listing.is_empty() {
        println!("No audio files found for '{}'", book);
        return Ok(());
    }

    println!("\n{} ({} chapters)", style(book).bold().cyan(), listing.len());
    println!("{}", "=".repeat(60));
    for entry in &listing {
        println!("{}", chapter_line(entry));
    }
    Ok(())
}

/// List recently opened books, dropping the ones that are gone
pub fn list_recent(ctx: &AppContext) -> Result<()> {
    let recent = ctx.shelf()?.recent().context("Failed to read recent books")?;

    if recent.is_empty() {
        println!("No recent books.");
        return Ok(());
    }

    println!("\n{}", style("Recent Books").bold().cyan());
    println!("{}", "=".repeat(60));
    for entry in &recent {
        println!("{}", recent_line(entry));
    }
    Ok(())
}

/// Forget a recent book and everything saved for it
pub fn forget_book(ctx: &AppContext, book: &str) -> Result<()> {
    if !ctx.stores.recent.contains(book) {
        println!("'{}' is not in the recent list.", book);
        return Ok(());
    }

    ctx.stores
        .recent
        .remove(book)
        .with_context(|| format!("Failed to forget '{}'", book))?;
    println!("{} Forgot '{}'", style("✓").green().bold(), book);
    Ok(())
}

/// List bookmarks, newest first
pub fn list_bookmarks(ctx: &AppContext) -> Result<()> {
    let bookmarks = ctx.stores.bookmarks.list_newest_first();

    if bookmarks.is_empty() {
        println!("No bookmarks yet. Press 'b' while playing to add one.");
        return Ok(());
    }

    println!("\n{} Bookmarks", style(bookmarks.len()).bold().cyan());
    println!("{}", "=".repeat(60));
    for (number, bookmark) in bookmarks.iter().enumerate() {
        println!("{}", bookmark_line(number + 1, bookmark));
    }
    Ok(())
}

/// Play a book from its current chapter, or from `chapter` (1-based) if given
pub async fn play_book(
    ctx: &AppContext,
    book: &str,
    resume: bool,
    chapter: Option<usize>,
) -> Result<()> {
    if let Some(number) = chapter {
        let Some(index) = number.checked_sub(1) else {
            bail!("Chapters are numbered from 1");
        };
        ctx.stores
            .preferences
            .request_chapter(index)
            .context("Failed to store chapter request")?;
    }

    println!("\n{} {}", style("▶").green().bold(), style(book).bold());
    player::start_playback(
        ctx,
        PlayRequest::Book {
            name: book.to_string(),
            resume,
        },
    )
    .await
}

/// Play from the N-th entry of the bookmark listing
pub async fn resume_bookmark(ctx: &AppContext, number: usize) -> Result<()> {
    let bookmarks = ctx.stores.bookmarks.list_newest_first();
    let Some(bookmark) = number.checked_sub(1).and_then(|i| bookmarks.get(i)) else {
        bail!(
            "No bookmark #{} ({} bookmarks saved)",
            number,
            bookmarks.len()
        );
    };

    println!("\n{} {}", style("▶").green().bold(), bookmark);
    player::start_playback(ctx, PlayRequest::Bookmark(bookmark.clone())).await
}

fn book_line(book: &Book) -> String {
    let cover = if book.has_cover() { "[cover]" } else { "" };
    format!("  {} {}", truncate(&book.name, 48), style(cover).dim())
        .trim_end()
        .to_string()
}

fn chapter_line(entry: &ChapterListing) -> String {
    let marker = if entry.is_current { "▶" } else { " " };
    let saved = if entry.saved_position_ms > 0 {
        format!("  (at {})", format_clock(entry.saved_position_ms))
    } else {
        String::new()
    };
    format!(
        "{} {:>3}. {}{}",
        marker,
        entry.chapter.index + 1,
        entry.chapter.display_name,
        saved
    )
}

fn recent_line(entry: &RecentEntry) -> String {
    match &entry.cover {
        Some(_) => format!("  {} [cover]", entry.book),
        None => format!("  {}", entry.book),
    }
}

fn bookmark_line(number: usize, bookmark: &Bookmark) -> String {
    let label = bookmark.label().replace('\n', " / ");
    format!("  {:>3}. {}", number, label)
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
