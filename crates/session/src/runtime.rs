// FILE: crates/session/src/runtime.rs

//! Single-task control loop around a [`PlaybackSession`]
//!
//! Commands, decoder events and the checkpoint ticker are multiplexed on one
//! tokio task, so every session transition runs on the same loop. The ticker
//! is only polled while the session reports it running.

use crate::backend::{DecoderBackend, EventReceiver};
use crate::error::{SessionError, SessionResult};
use crate::session::PlaybackSession;
use audiofolio_core::{Bookmark, PlaybackState};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

const COMMAND_QUEUE_DEPTH: usize = 32;

#[derive(Debug)]
pub enum SessionCommand {
    Start(String),
    Pause,
    Resume,
    Toggle,
    SeekBy(i64),
    SeekTo(u64),
    ChapterChange(usize),
    Next,
    Previous,
    ResumeFromBookmark {
        book: String,
        chapter_index: usize,
        position_ms: u64,
    },
    RestoreSavedPosition,
    ApplyChapterRequest,
    CaptureBookmark(oneshot::Sender<SessionResult<Bookmark>>),
    Suspend,
    Shutdown,
}

/// What the loop publishes after every step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub playback: PlaybackState,
    pub status: String,
}

impl SessionSnapshot {
    fn of<B: DecoderBackend>(session: &PlaybackSession<B>) -> Self {
        Self {
            playback: session.snapshot(),
            status: session.status_line(),
        }
    }
}

pub struct SessionRuntime<B: DecoderBackend> {
    session: PlaybackSession<B>,
    commands: mpsc::Receiver<SessionCommand>,
    events: EventReceiver,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl<B: DecoderBackend> SessionRuntime<B> {
    /// `events` must be the receiving end of the channel the backend sends to
    pub fn new(session: PlaybackSession<B>, events: EventReceiver) -> (Self, SessionHandle) {
        let (command_tx, commands) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (snapshots, snapshot_rx) = watch::channel(SessionSnapshot::of(&session));

        let runtime = Self {
            session,
            commands,
            events,
            snapshots,
        };
        let handle = SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (runtime, handle)
    }

    /// Runs until `Shutdown` or until every handle is dropped
    ///
    /// Hands the session back so callers can inspect its final state.
    pub async fn run(self) -> PlaybackSession<B> {
        let Self {
            mut session,
            mut commands,
            mut events,
            snapshots,
        } = self;

        let period = session.config().tick_interval.max(Duration::from_millis(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut was_ticking = false;

        loop {
            let ticking = session.ticker_running();
            if ticking && !was_ticking {
                ticker.reset();
            }
            was_ticking = ticking;

            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => {
                        session.shutdown();
                        snapshots.send_replace(SessionSnapshot::of(&session));
                        break;
                    }
                    Some(command) => execute(&mut session, command),
                },
                Some(event) = events.recv() => {
                    log::trace!("Decoder event: {:?}", event);
                    session.handle_event(event);
                }
                _ = ticker.tick(), if ticking => session.on_tick(),
            }

            snapshots.send_replace(SessionSnapshot::of(&session));
        }

        log::debug!("Session loop stopped");
        session
    }
}

fn execute<B: DecoderBackend>(session: &mut PlaybackSession<B>, command: SessionCommand) {
    let name = format!("{:?}", command);
    let result = match command {
        SessionCommand::Start(book) => session.start(&book),
        SessionCommand::Pause => session.pause(),
        SessionCommand::Resume => session.resume(),
        SessionCommand::Toggle => session.toggle(),
        SessionCommand::SeekBy(delta_ms) => session.seek_by(delta_ms),
        SessionCommand::SeekTo(position_ms) => session.seek_to(position_ms),
        SessionCommand::ChapterChange(index) => session.chapter_change(index),
        SessionCommand::Next => session.next_chapter(),
        SessionCommand::Previous => session.previous_chapter(),
        SessionCommand::ResumeFromBookmark {
            book,
            chapter_index,
            position_ms,
        } => session.resume_from_bookmark(&book, chapter_index, position_ms),
        SessionCommand::RestoreSavedPosition => session.restore_saved_position().map(|_| ()),
        SessionCommand::ApplyChapterRequest => session.apply_chapter_request().map(|_| ()),
        SessionCommand::CaptureBookmark(reply) => {
            let _ = reply.send(session.capture_bookmark());
            Ok(())
        }
        SessionCommand::Suspend => {
            session.suspend();
            Ok(())
        }
        SessionCommand::Shutdown => {
            session.shutdown();
            Ok(())
        }
    };

    if let Err(e) = result {
        log::warn!("{} failed: {}", name, e);
    }
}

/// Starts the loop on the current tokio runtime
pub fn spawn_session<B>(
    session: PlaybackSession<B>,
    events: EventReceiver,
) -> (SessionHandle, JoinHandle<PlaybackSession<B>>)
where
    B: DecoderBackend + 'static,
{
    let (runtime, handle) = SessionRuntime::new(session, events);
    (handle, tokio::spawn(runtime.run()))
}

/// Cloneable sender side of a running session
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub async fn send(&self, command: SessionCommand) -> SessionResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }

    pub async fn start(&self, book: impl Into<String>) -> SessionResult<()> {
        self.send(SessionCommand::Start(book.into())).await
    }

    pub async fn pause(&self) -> SessionResult<()> {
        self.send(SessionCommand::Pause).await
    }

    pub async fn resume(&self) -> SessionResult<()> {
        self.send(SessionCommand::Resume).await
    }

    pub async fn toggle(&self) -> SessionResult<()> {
        self.send(SessionCommand::Toggle).await
    }

    pub async fn seek_by(&self, delta_ms: i64) -> SessionResult<()> {
        self.send(SessionCommand::SeekBy(delta_ms)).await
    }

    pub async fn seek_to(&self, position_ms: u64) -> SessionResult<()> {
        self.send(SessionCommand::SeekTo(position_ms)).await
    }

    pub async fn chapter_change(&self, index: usize) -> SessionResult<()> {
        self.send(SessionCommand::ChapterChange(index)).await
    }

    pub async fn next(&self) -> SessionResult<()> {
        self.send(SessionCommand::Next).await
    }

    pub async fn previous(&self) -> SessionResult<()> {
        self.send(SessionCommand::Previous).await
    }

    pub async fn resume_from_bookmark(&self, bookmark: &Bookmark) -> SessionResult<()> {
        self.send(SessionCommand::ResumeFromBookmark {
            book: bookmark.book.clone(),
            chapter_index: bookmark.chapter_index,
            position_ms: bookmark.position_ms,
        })
        .await
    }

    pub async fn restore_saved_position(&self) -> SessionResult<()> {
        self.send(SessionCommand::RestoreSavedPosition).await
    }

    pub async fn apply_chapter_request(&self) -> SessionResult<()> {
        self.send(SessionCommand::ApplyChapterRequest).await
    }

    pub async fn capture_bookmark(&self) -> SessionResult<Bookmark> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::CaptureBookmark(reply)).await?;
        response.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn suspend(&self) -> SessionResult<()> {
        self.send(SessionCommand::Suspend).await
    }

    pub async fn shutdown(&self) -> SessionResult<()> {
        self.send(SessionCommand::Shutdown).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}
