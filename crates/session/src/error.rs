// FILE: crates/session/src/error.rs

use audiofolio_core::{AppError, SessionState};
use audiofolio_store::StoreError;
use thiserror::Error;

/// Decoder and audio output failures
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("Seek error: {0}")]
    SeekError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors returned by session operations
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No audio files found for '{book}'")]
    NoChapters { book: String },

    #[error("No book loaded")]
    NoBook,

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Bookmark not saved: {0}")]
    Bookmark(#[from] StoreError),

    #[error("Session is no longer running")]
    Closed,
}

impl SessionError {
    pub(crate) fn invalid(operation: &'static str, state: SessionState) -> Self {
        SessionError::InvalidState { operation, state }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoChapters { book } => AppError::not_found("chapters", book),
            SessionError::NoBook => AppError::not_found("book", "none selected"),
            SessionError::InvalidState { operation, state } => AppError::InvalidState {
                operation: operation.to_string(),
                state: state.to_string(),
            },
            SessionError::Engine(e) => AppError::EngineFailure {
                file: Default::default(),
                message: e.to_string(),
            },
            SessionError::Bookmark(e) => e.into(),
            SessionError::Closed => AppError::InvalidState {
                operation: "send command".to_string(),
                state: "closed".to_string(),
            },
        }
    }
}
