//! Decoder capability used by the session
//!
//! Opening is asynchronous: [`DecoderBackend::open`] returns at once and the
//! result arrives later as [`SessionEvent::Opened`]. Every event carries the
//! generation of the open request it belongs to, so the session can drop
//! events from superseded requests.

mod decoder;
mod output;
pub mod native;
mod playback_thread;
pub mod scripted;

use crate::error::EngineError;
use std::fmt;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Control surface of one opened chapter
pub trait DecoderHandle: Send {
    fn start(&mut self) -> Result<(), EngineError>;

    fn pause(&mut self) -> Result<(), EngineError>;

    fn seek(&mut self, position_ms: u64) -> Result<(), EngineError>;

    /// Length of the chapter, 0 when unknown
    fn duration_ms(&self) -> u64;

    fn position_ms(&self) -> u64;

    /// Stops output and frees the decoder
    fn release(self: Box<Self>);
}

pub type BoxedHandle = Box<dyn DecoderHandle>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub generation: u64,
    pub file: PathBuf,
}

pub trait DecoderBackend: Send {
    /// Starts opening `request.file`
    ///
    /// Must eventually produce exactly one `SessionEvent::Opened` with the
    /// request's generation.
    fn open(&mut self, request: OpenRequest);
}

pub enum SessionEvent {
    Opened {
        generation: u64,
        result: Result<BoxedHandle, EngineError>,
    },
    /// The decoder reached the end of the chapter
    Completed { generation: u64 },
    Failed { generation: u64, message: String },
}

impl SessionEvent {
    pub fn generation(&self) -> u64 {
        match self {
            SessionEvent::Opened { generation, .. }
            | SessionEvent::Completed { generation }
            | SessionEvent::Failed { generation, .. } => *generation,
        }
    }
}

impl fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::Opened { generation, result } => f
                .debug_struct("Opened")
                .field("generation", generation)
                .field("ok", &result.is_ok())
                .finish(),
            SessionEvent::Completed { generation } => f
                .debug_struct("Completed")
                .field("generation", generation)
                .finish(),
            SessionEvent::Failed {
                generation,
                message,
            } => f
                .debug_struct("Failed")
                .field("generation", generation)
                .field("message", message)
                .finish(),
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
