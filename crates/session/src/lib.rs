//! Audiofolio playback session
//!
//! [`PlaybackSession`] is the state machine behind the player: it loads a
//! book's chapters, owns the one decoder handle, checkpoints positions and
//! auto-advances through the book. [`SessionRuntime`] drives it from a single
//! tokio task, and [`Shelf`] is the read side used to browse the library.
//!
//! Decoding is behind [`DecoderBackend`]; [`SymphoniaBackend`] plays real
//! files and [`ScriptedBackend`] resolves opens on demand for tests.

pub mod backend;
pub mod config;
pub mod error;
pub mod runtime;
pub mod session;
pub mod shelf;

pub use backend::native::SymphoniaBackend;
pub use backend::scripted::{HandleCall, ScriptedBackend};
pub use backend::{
    event_channel, BoxedHandle, DecoderBackend, DecoderHandle, EventReceiver, EventSender,
    OpenRequest, SessionEvent,
};
pub use config::SessionConfig;
pub use error::{EngineError, EngineResult, SessionError, SessionResult};
pub use runtime::{spawn_session, SessionCommand, SessionHandle, SessionRuntime, SessionSnapshot};
pub use session::PlaybackSession;
pub use shelf::{ChapterListing, Shelf};
