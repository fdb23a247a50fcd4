// FILE: crates/cli/src/player.rs

use crate::context::AppContext;
use anyhow::{bail, Context, Result};
use audiofolio_core::{format_clock, Bookmark, SessionState};
use audiofolio_session::{
    event_channel, spawn_session, PlaybackSession, SessionHandle, SessionSnapshot,
    SymphoniaBackend,
};
use console::{style, Key, Term};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

const REDRAW_INTERVAL: Duration = Duration::from_millis(500);
const BAR_WIDTH: usize = 50;

/// What to play when the player opens
#[derive(Debug, Clone)]
pub enum PlayRequest {
    /// A book from its current chapter; `resume` restores the saved position
    Book { name: String, resume: bool },
    Bookmark(Bookmark),
}

pub async fn start_playback(ctx: &AppContext, request: PlayRequest) -> Result<()> {
    let catalog = ctx.catalog()?;
    let book = match &request {
        PlayRequest::Book { name, .. } => name.clone(),
        PlayRequest::Bookmark(bookmark) => bookmark.book.clone(),
    };
    if catalog.load_chapters(&book).is_empty() {
        bail!("No audio files found for '{}'", book);
    }

    let (events_tx, events_rx) = event_channel();
    let backend = SymphoniaBackend::new(events_tx);
    let session = PlaybackSession::new(backend, catalog, ctx.stores.clone(), ctx.session_config());
    let (handle, join) = spawn_session(session, events_rx);

    match &request {
        PlayRequest::Book { name, resume } => {
            handle.start(name.as_str()).await?;
            handle.apply_chapter_request().await?;
            if *resume {
                handle.restore_saved_position().await?;
            }
        }
        PlayRequest::Bookmark(bookmark) => handle.resume_from_bookmark(bookmark).await?,
    }

    let seek_step_ms = ctx.session_config().seek_step_ms;
    let result = run_player_ui(&handle, seek_step_ms).await;

    if let Err(e) = handle.shutdown().await {
        log::warn!("Session already stopped: {}", e);
    }
    join.await.context("Playback task panicked")?;

    result
}

fn spawn_key_reader(term: Term) -> mpsc::UnboundedReceiver<Key> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("key-reader".to_string())
        .spawn(move || {
            while let Ok(key) = term.read_key() {
                if tx.send(key).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("Keyboard input unavailable: {}", e);
    }
    rx
}

async fn run_player_ui(handle: &SessionHandle, seek_step_ms: u64) -> Result<()> {
    let term = Term::stdout();
    if term.hide_cursor().is_err() {
        log::warn!("Failed to hide cursor");
    }

    let result = player_loop(&term, handle, seek_step_ms).await;

    let _ = term.show_cursor();
    result
}

async fn player_loop(term: &Term, handle: &SessionHandle, seek_step_ms: u64) -> Result<()> {
    let mut keys = spawn_key_reader(Term::stdout());
    let mut keys_open = true;
    let mut snapshots = handle.subscribe();
    let mut redraw = interval(REDRAW_INTERVAL);
    redraw.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut notice: Option<String> = None;
    let mut seen_active = false;

    loop {
        let snapshot = handle.snapshot();
        if snapshot.playback.state != SessionState::Idle {
            seen_active = true;
        } else if seen_active {
            term.write_line(&format!("\n  {}", style("Finished.").green()))?;
            break;
        }
        if !keys_open && snapshot.playback.state == SessionState::Error {
            break;
        }

        draw_player_ui(term, &snapshot, notice.as_deref())?;

        tokio::select! {
            key = keys.recv(), if keys_open => {
                let Some(key) = key else {
                    keys_open = false;
                    continue;
                };
                match key {
                    Key::Char(' ') => handle.toggle().await?,
                    Key::Char('n') => handle.next().await?,
                    Key::Char('p') => handle.previous().await?,
                    Key::ArrowLeft => handle.seek_by(-(seek_step_ms as i64)).await?,
                    Key::ArrowRight => handle.seek_by(seek_step_ms as i64).await?,
                    Key::Char('b') => {
                        notice = Some(match handle.capture_bookmark().await {
                            Ok(bookmark) => format!("Bookmarked {}", bookmark),
                            Err(e) => format!("Could not bookmark: {}", e),
                        });
                    }
                    Key::Char('q') | Key::Escape => break,
                    _ => {}
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = redraw.tick() => {}
        }
    }

    Ok(())
}

fn draw_player_ui(term: &Term, snapshot: &SessionSnapshot, notice: Option<&str>) -> Result<()> {
    let playback = &snapshot.playback;
    term.clear_screen().context("Failed to clear screen")?;

    let book = playback.book.as_deref().unwrap_or("-");
    term.write_line(&format!("\n  {}", style(book).bold().cyan()))
        .context("Failed to write title")?;
    term.write_line(&format!("  {}", chapter_line(snapshot)))
        .context("Failed to write chapter")?;
    term.write_line("").context("Failed to write blank line")?;

    term.write_line(&format!(
        "  {} / {}",
        format_clock(playback.position_ms),
        format_clock(playback.duration_ms)
    ))
    .context("Failed to write position")?;
    term.write_line(&format!("  {}", progress_bar(playback.progress_percentage())))
        .context("Failed to write progress bar")?;
    term.write_line("").context("Failed to write blank line")?;

    let status = match playback.state {
        SessionState::Playing => style("Playing").green(),
        SessionState::Paused => style("Paused").yellow(),
        SessionState::Loading => style("Loading").cyan(),
        SessionState::Error => style("Error").red(),
        SessionState::Idle | SessionState::Completed => style("Stopped").dim(),
    };
    term.write_line(&format!("  Status: {}", status))
        .context("Failed to write status")?;
    if let Some(notice) = notice {
        term.write_line(&format!("  {}", style(notice).dim()))
            .context("Failed to write notice")?;
    }
    term.write_line("").context("Failed to write blank line")?;

    term.write_line("  Controls:")
        .context("Failed to write controls header")?;
    for line in [
        "    Space   - Play/Pause",
        "    ←/→     - Seek back/forward",
        "    N/P     - Next/previous chapter",
        "    B       - Bookmark",
        "    Q/Esc   - Quit",
    ] {
        term.write_line(line).context("Failed to write control")?;
    }

    Ok(())
}

fn chapter_line(snapshot: &SessionSnapshot) -> String {
    let playback = &snapshot.playback;
    if playback.chapter_count == 0 {
        return snapshot.status.clone();
    }
    format!(
        "Chapter {}/{}: {}",
        playback.chapter_index + 1,
        playback.chapter_count,
        snapshot.status
    )
}

fn progress_bar(percentage: f32) -> String {
    let percent = (percentage.clamp(0.0, 100.0)) as usize;
    let filled = (percent * BAR_WIDTH / 100).min(BAR_WIDTH);
    format!(
        "[{}{}] {}%",
        "=".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        percent
    )
}
