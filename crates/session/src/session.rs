// FILE: crates/session/src/session.rs

//! The playback state machine
//!
//! [`PlaybackSession`] owns every piece of mutable session state: the loaded
//! book and its chapters, the single decoder handle, and the generation of
//! the open request currently in flight. It is driven from one control loop
//! (see [`crate::runtime`]); decoder results come back through
//! [`PlaybackSession::handle_event`].

use crate::backend::{BoxedHandle, DecoderBackend, OpenRequest, SessionEvent};
use crate::config::SessionConfig;
use crate::error::{EngineError, SessionError, SessionResult};
use audiofolio_core::{Bookmark, Chapter, PlaybackState, SessionState, Timestamp};
use audiofolio_library::ChapterCatalog;
use audiofolio_store::Stores;
use log::{debug, error, info, trace, warn};
use std::path::{Path, PathBuf};

const NO_AUDIO_FILES: &str = "No audio files found";
const UNKNOWN_CHAPTER: &str = "Unknown chapter";

/// Where a newly opened chapter starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    /// Leave the saved position untouched and start at the beginning
    Resume,
    /// Record `ms` as the chapter's position and seek there once open
    StartAt(u64),
}

/// Start offset applied once the chapter is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueuedSeek {
    /// Transport seek; a target near the end finishes the chapter
    User(u64),
    /// Bookmark or saved position; only clamped
    Restore(u64),
}

impl QueuedSeek {
    fn position_ms(self) -> u64 {
        match self {
            QueuedSeek::User(ms) | QueuedSeek::Restore(ms) => ms,
        }
    }
}

/// Open request waiting for its `Opened` event
#[derive(Debug, Clone, Copy)]
struct PendingOpen {
    generation: u64,
    auto_play: bool,
    seek_to: Option<QueuedSeek>,
}

pub struct PlaybackSession<B: DecoderBackend> {
    backend: B,
    catalog: ChapterCatalog,
    stores: Stores,
    config: SessionConfig,

    state: SessionState,
    book: Option<String>,
    cover: Option<PathBuf>,
    chapters: Vec<Chapter>,
    index: usize,

    handle: Option<BoxedHandle>,
    generation: u64,
    pending: Option<PendingOpen>,

    position_ms: u64,
    duration_ms: u64,
    ticker_running: bool,
    ticks: u32,
    error: Option<String>,
}

impl<B: DecoderBackend> PlaybackSession<B> {
    pub fn new(backend: B, catalog: ChapterCatalog, stores: Stores, config: SessionConfig) -> Self {
        Self {
            backend,
            catalog,
            stores,
            config,
            state: SessionState::Idle,
            book: None,
            cover: None,
            chapters: Vec::new(),
            index: 0,
            handle: None,
            generation: 0,
            pending: None,
            position_ms: 0,
            duration_ms: 0,
            ticker_running: false,
            ticks: 0,
            error: None,
        }
    }

    // ---- queries ----

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn book(&self) -> Option<&str> {
        self.book.as_deref()
    }

    pub fn cover(&self) -> Option<&Path> {
        self.cover.as_deref()
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter_index(&self) -> usize {
        self.index
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.chapters.get(self.index)
    }

    /// Generation of the most recent open request
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn ticker_running(&self) -> bool {
        self.ticker_running
    }

    pub fn position_ms(&self) -> u64 {
        self.live_position()
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn catalog(&self) -> &ChapterCatalog {
        &self.catalog
    }

    pub fn snapshot(&self) -> PlaybackState {
        PlaybackState {
            state: self.state,
            book: self.book.clone(),
            chapter_index: self.index,
            chapter_count: self.chapters.len(),
            position_ms: self.live_position(),
            duration_ms: self.duration_ms,
            is_playing: self.is_playing(),
        }
    }

    /// One-line description for display
    pub fn status_line(&self) -> String {
        if let Some(message) = &self.error {
            return message.clone();
        }
        if self.book.is_some() && self.chapters.is_empty() {
            return NO_AUDIO_FILES.to_string();
        }
        self.current_chapter()
            .map(|c| c.display_name.clone())
            .unwrap_or_else(|| UNKNOWN_CHAPTER.to_string())
    }

    // ---- book loading ----

    /// Loads `book` and opens its current chapter with auto-play
    ///
    /// The chapter comes from the saved pointer. Its saved position is not
    /// applied; see [`Self::restore_saved_position`].
    pub fn start(&mut self, book: &str) -> SessionResult<()> {
        self.checkpoint();
        self.invalidate();
        self.load_book(book);

        if self.chapters.is_empty() {
            self.set_state(SessionState::Idle);
            return Err(SessionError::NoChapters {
                book: book.to_string(),
            });
        }

        let saved = self.stores.positions.chapter_index(book);
        let index = saved.min(self.chapters.len() - 1);
        info!("Starting '{}' at chapter {}", book, index);
        self.open_chapter(index, true, None, Entry::Resume);
        Ok(())
    }

    fn load_book(&mut self, book: &str) {
        self.chapters = self.catalog.load_chapters(book);
        self.cover = self.catalog.cover_for(book);
        self.book = Some(book.to_string());
        self.index = 0;
        self.position_ms = 0;
        self.duration_ms = 0;
        self.error = None;

        if self.chapters.is_empty() {
            warn!("No audio files found for '{}'", book);
            return;
        }

        let cover = self
            .cover
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        if let Err(e) = self.stores.recent.record_opened(book, cover.as_deref()) {
            warn!("Could not record '{}' as recent: {}", book, e);
        }
        if let Err(e) = self
            .stores
            .preferences
            .set_selected_book(book, cover.as_deref())
        {
            warn!("Could not store the selected book: {}", e);
        }
    }

    /// Releases the current handle and opens chapter `index`
    ///
    /// The chapter pointer, the departing chapter's position and (for
    /// `Entry::StartAt`) the target's start position are written as one
    /// batch before the open is requested.
    fn open_chapter(
        &mut self,
        index: usize,
        auto_play: bool,
        departing: Option<(String, u64)>,
        entry: Entry,
    ) {
        self.invalidate();

        let Some(chapter) = self.chapters.get(index).cloned() else {
            self.set_state(SessionState::Idle);
            return;
        };

        let mut writes: Vec<(&str, u64)> = Vec::with_capacity(2);
        if let Some((name, position_ms)) = &departing {
            writes.push((name.as_str(), *position_ms));
        }
        let seek_to = match entry {
            Entry::Resume => None,
            Entry::StartAt(ms) => {
                writes.push((chapter.display_name.as_str(), ms));
                (ms > 0).then_some(ms)
            }
        };
        if let Err(e) = self
            .stores
            .positions
            .switch_chapter(&chapter.book, index, &writes)
        {
            warn!("Could not store chapter switch for '{}': {}", chapter.book, e);
        }

        self.index = index;
        self.position_ms = seek_to.unwrap_or(0);
        let seek_to = seek_to.map(QueuedSeek::Restore);
        self.duration_ms = 0;
        self.error = None;
        self.pending = Some(PendingOpen {
            generation: self.generation,
            auto_play,
            seek_to,
        });
        self.set_state(SessionState::Loading);

        debug!(
            "Opening chapter {} of '{}' (generation {})",
            index, chapter.book, self.generation
        );
        self.backend.open(OpenRequest {
            generation: self.generation,
            file: chapter.file,
        });
    }

    /// Drops the handle and makes every in-flight open stale
    fn invalidate(&mut self) {
        self.release_handle();
        self.stop_ticker();
        self.generation += 1;
        self.pending = None;
    }

    fn release_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
    }

    // ---- decoder events ----

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Opened { generation, result } => self.on_opened(generation, result),
            SessionEvent::Completed { generation } => {
                if generation != self.generation || !self.state.has_open_chapter() {
                    debug!("Ignoring stale completion (generation {})", generation);
                    return;
                }
                self.complete_chapter();
            }
            SessionEvent::Failed {
                generation,
                message,
            } => {
                if generation != self.generation {
                    debug!("Ignoring stale failure (generation {})", generation);
                    return;
                }
                self.fail(message);
            }
        }
    }

    fn on_opened(&mut self, generation: u64, result: Result<BoxedHandle, EngineError>) {
        let pending = match self.pending {
            Some(pending) if pending.generation == generation => pending,
            _ => {
                debug!("Discarding stale open (generation {})", generation);
                if let Ok(handle) = result {
                    handle.release();
                }
                return;
            }
        };
        self.pending = None;

        let mut handle = match result {
            Ok(handle) => handle,
            Err(e) => {
                self.fail(e.to_string());
                return;
            }
        };

        self.duration_ms = handle.duration_ms();
        self.position_ms = 0;
        self.handle = Some(handle);

        if let Some(seek) = pending.seek_to {
            let requested = seek.position_ms();
            let target = self.clamp(requested);
            if target != requested {
                // the start offset was stored before the duration was known
                self.persist_position(target);
            }

            let honor_completion = matches!(seek, QueuedSeek::User(_));
            if self.apply_seek(target, honor_completion).is_err() {
                return;
            }
            if self.handle.is_none() {
                // the seek finished the chapter
                return;
            }
        }

        if pending.auto_play {
            if let Err(e) = self.play_handle() {
                debug!("Auto-play failed: {}", e);
            }
        } else {
            self.set_state(SessionState::Paused);
        }
    }

    /// Finishes the current chapter and moves on to the next one
    fn complete_chapter(&mut self) {
        self.stop_ticker();
        self.set_state(SessionState::Completed);

        if let Some((book, chapter)) = self.current_names() {
            if let Err(e) = self.stores.positions.clear(&book, &chapter) {
                warn!("Could not clear position of '{}': {}", chapter, e);
            }
        }

        let next = self.index + 1;
        if next < self.chapters.len() {
            self.open_chapter(next, true, None, Entry::StartAt(0));
        } else {
            info!("Reached the end of '{}'", self.book.as_deref().unwrap_or_default());
            self.release_handle();
            self.position_ms = 0;
            self.set_state(SessionState::Idle);
        }
    }

    fn fail(&mut self, message: String) {
        error!("Playback failed: {}", message);
        self.release_handle();
        self.stop_ticker();
        self.pending = None;
        self.error = Some(message);
        self.set_state(SessionState::Error);
    }

    // ---- transport ----

    pub fn pause(&mut self) -> SessionResult<()> {
        match self.state {
            SessionState::Playing => {
                let position = self.refresh_position();
                if let Some(handle) = self.handle.as_mut() {
                    if let Err(e) = handle.pause() {
                        let message = e.to_string();
                        self.fail(message);
                        return Err(e.into());
                    }
                }
                self.stop_ticker();
                self.persist_position(position);
                self.set_state(SessionState::Paused);
                Ok(())
            }
            SessionState::Loading => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.auto_play = false;
                }
                Ok(())
            }
            SessionState::Paused => Ok(()),
            state => Err(SessionError::invalid("pause", state)),
        }
    }

    /// Continues in place without seeking
    pub fn resume(&mut self) -> SessionResult<()> {
        match self.state {
            SessionState::Paused => self.play_handle(),
            SessionState::Loading => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.auto_play = true;
                }
                Ok(())
            }
            SessionState::Playing => Ok(()),
            state => Err(SessionError::invalid("resume", state)),
        }
    }

    /// Play button: pause, resume, or reopen the current chapter
    pub fn toggle(&mut self) -> SessionResult<()> {
        match self.state {
            SessionState::Playing => self.pause(),
            SessionState::Paused => self.resume(),
            SessionState::Loading => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.auto_play = !pending.auto_play;
                }
                Ok(())
            }
            SessionState::Idle | SessionState::Completed => {
                let Some(book) = self.book.clone() else {
                    return Err(SessionError::NoBook);
                };
                if self.chapters.is_empty() {
                    return Err(SessionError::NoChapters { book });
                }
                self.open_chapter(self.index, true, None, Entry::Resume);
                Ok(())
            }
            state => Err(SessionError::invalid("toggle playback", state)),
        }
    }

    fn play_handle(&mut self) -> SessionResult<()> {
        let Some(handle) = self.handle.as_mut() else {
            return Err(SessionError::invalid("play", self.state));
        };
        if let Err(e) = handle.start() {
            let message = e.to_string();
            self.fail(message);
            return Err(e.into());
        }
        self.set_state(SessionState::Playing);
        self.start_ticker();
        Ok(())
    }

    /// Seeks to an absolute position
    ///
    /// A target within the completion threshold of the end finishes the
    /// chapter exactly as natural completion does. While loading, the
    /// target replaces the pending start offset.
    pub fn seek_to(&mut self, position_ms: u64) -> SessionResult<()> {
        match self.state {
            SessionState::Loading => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.seek_to = Some(QueuedSeek::User(position_ms));
                }
                self.position_ms = position_ms;
                Ok(())
            }
            SessionState::Playing | SessionState::Paused => self.apply_seek(position_ms, true),
            state => Err(SessionError::invalid("seek", state)),
        }
    }

    pub fn seek_by(&mut self, delta_ms: i64) -> SessionResult<()> {
        let base = match self.state {
            SessionState::Loading => self
                .pending
                .and_then(|p| p.seek_to)
                .map_or(0, QueuedSeek::position_ms),
            _ => self.refresh_position(),
        };
        self.seek_to(base.saturating_add_signed(delta_ms))
    }

    fn apply_seek(&mut self, position_ms: u64, honor_completion: bool) -> SessionResult<()> {
        let target = self.clamp(position_ms);

        if honor_completion
            && self.duration_ms > 0
            && self.duration_ms - target <= self.config.completion_threshold_ms
        {
            debug!("Seek to {} ms lands at the end of the chapter", target);
            self.complete_chapter();
            return Ok(());
        }

        if let Some(handle) = self.handle.as_mut() {
            if let Err(e) = handle.seek(target) {
                let message = e.to_string();
                self.fail(message);
                return Err(e.into());
            }
        }
        self.position_ms = target;
        Ok(())
    }

    fn clamp(&self, position_ms: u64) -> u64 {
        if self.duration_ms > 0 {
            position_ms.min(self.duration_ms)
        } else {
            position_ms
        }
    }

    // ---- navigation ----

    /// Explicit navigation to chapter `index`, starting at 0
    pub fn chapter_change(&mut self, index: usize) -> SessionResult<()> {
        let Some(book) = self.book.clone() else {
            return Err(SessionError::NoBook);
        };
        if self.chapters.is_empty() {
            return Err(SessionError::NoChapters { book });
        }

        let index = index.min(self.chapters.len() - 1);
        let departing = self.departing();
        self.open_chapter(index, true, departing, Entry::StartAt(0));
        Ok(())
    }

    pub fn next_chapter(&mut self) -> SessionResult<()> {
        if self.index + 1 < self.chapters.len() {
            self.chapter_change(self.index + 1)
        } else {
            Ok(())
        }
    }

    pub fn previous_chapter(&mut self) -> SessionResult<()> {
        if self.index > 0 && !self.chapters.is_empty() {
            self.chapter_change(self.index - 1)
        } else {
            Ok(())
        }
    }

    /// Plays `book` from a bookmarked chapter and position
    pub fn resume_from_bookmark(
        &mut self,
        book: &str,
        chapter_index: usize,
        position_ms: u64,
    ) -> SessionResult<()> {
        if self.book.as_deref() != Some(book) {
            self.checkpoint();
            self.invalidate();
            self.load_book(book);
            if self.chapters.is_empty() {
                self.set_state(SessionState::Idle);
                return Err(SessionError::NoChapters {
                    book: book.to_string(),
                });
            }
            let index = chapter_index.min(self.chapters.len() - 1);
            self.open_chapter(index, true, None, Entry::StartAt(position_ms));
            return Ok(());
        }

        if self.chapters.is_empty() {
            return Err(SessionError::NoChapters {
                book: book.to_string(),
            });
        }
        let index = chapter_index.min(self.chapters.len() - 1);

        if index == self.index {
            match self.state {
                SessionState::Playing | SessionState::Paused => {
                    self.apply_seek(position_ms, false)?;
                    if self.state == SessionState::Paused {
                        self.play_handle()?;
                    }
                    return Ok(());
                }
                SessionState::Loading => {
                    if let Some(pending) = self.pending.as_mut() {
                        pending.seek_to = Some(QueuedSeek::Restore(position_ms));
                        pending.auto_play = true;
                    }
                    self.position_ms = position_ms;
                    return Ok(());
                }
                _ => {}
            }
        }

        let departing = self.departing();
        self.open_chapter(index, true, departing, Entry::StartAt(position_ms));
        Ok(())
    }

    /// Seeks the current chapter to its saved position
    ///
    /// Returns the position that was applied.
    pub fn restore_saved_position(&mut self) -> SessionResult<u64> {
        let Some((book, chapter)) = self.current_names() else {
            return Err(SessionError::NoBook);
        };
        let saved = self.stores.positions.get(&book, &chapter);

        match self.state {
            SessionState::Loading => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.seek_to = Some(QueuedSeek::Restore(saved));
                }
                self.position_ms = saved;
            }
            SessionState::Playing | SessionState::Paused => self.apply_seek(saved, false)?,
            state => return Err(SessionError::invalid("restore position", state)),
        }
        debug!("Restored '{}' to {} ms", chapter, saved);
        Ok(saved)
    }

    /// Performs a pending chapter-jump request, if one was left
    pub fn apply_chapter_request(&mut self) -> SessionResult<bool> {
        match self.stores.preferences.take_chapter_request() {
            Some(index) => {
                self.chapter_change(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ---- lifecycle ----

    /// Called when the app goes to the background
    pub fn suspend(&mut self) {
        self.checkpoint();
    }

    pub fn shutdown(&mut self) {
        self.checkpoint();
        self.invalidate();
        self.set_state(SessionState::Idle);
    }

    pub fn capture_bookmark(&mut self) -> SessionResult<Bookmark> {
        let Some(book) = self.book.clone() else {
            return Err(SessionError::NoBook);
        };
        let Some(chapter) = self.current_chapter().cloned() else {
            return Err(SessionError::NoChapters { book });
        };

        let position_ms = self.refresh_position();
        let bookmark = Bookmark::new(
            book,
            chapter.display_name,
            chapter.index,
            position_ms,
            Timestamp::now(),
        );
        self.stores.bookmarks.add(&bookmark)?;
        info!("Bookmark added: {}", bookmark);
        Ok(bookmark)
    }

    // ---- checkpointing ----

    pub fn on_tick(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }
        let position = self.refresh_position();
        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks % self.config.checkpoint_every_ticks.max(1) == 0 {
            trace!("Checkpoint at {} ms", position);
            self.persist_position(position);
        }
    }

    /// Writes the current position if a chapter is open
    pub fn checkpoint(&mut self) {
        if !self.state.has_open_chapter() {
            return;
        }
        let position = self.refresh_position();
        self.persist_position(position);
    }

    fn persist_position(&self, position_ms: u64) {
        if let Some((book, chapter)) = self.current_names() {
            if let Err(e) = self.stores.positions.set(&book, &chapter, position_ms) {
                warn!("Could not save position of '{}': {}", chapter, e);
            }
        }
    }

    fn start_ticker(&mut self) {
        self.ticker_running = true;
        self.ticks = 0;
    }

    fn stop_ticker(&mut self) {
        self.ticker_running = false;
    }

    // ---- helpers ----

    fn live_position(&self) -> u64 {
        match &self.handle {
            Some(handle) => self.clamp(handle.position_ms()),
            None => self.position_ms,
        }
    }

    fn refresh_position(&mut self) -> u64 {
        self.position_ms = self.live_position();
        self.position_ms
    }

    fn current_names(&self) -> Option<(String, String)> {
        let book = self.book.clone()?;
        let chapter = self.current_chapter()?.display_name.clone();
        Some((book, chapter))
    }

    fn departing(&mut self) -> Option<(String, u64)> {
        if !self.state.has_open_chapter() {
            return None;
        }
        let position = self.refresh_position();
        self.current_names().map(|(_, chapter)| (chapter, position))
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!("Session {} -> {}", self.state, state);
            self.state = state;
        }
    }
}
