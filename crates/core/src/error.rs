//! Error types and recovery strategies for Audiofolio
//!
//! Errors are grouped into the classes the playback core has to react to:
//! - **NotFound**: a book, chapter or file is missing. The caller degrades to an
//!   empty chapter list or an "unknown chapter" display.
//! - **EngineFailure**: the decoder could not open or play a file. The session
//!   enters its error state and waits for an explicit retry.
//! - **PersistenceFailure**: the preference store is unreadable. Treated as a
//!   cache miss and never surfaced to the session.
//! - **MalformedRecord**: a persisted record failed to parse and is skipped.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Nothing to do, the operation already degraded gracefully
    Degrade,
    /// Fall back to default values and keep going
    UseDefaults,
    /// Drop the offending record and continue with the rest
    SkipRecord,
    /// Wait for the user to retry the operation explicitly
    ExplicitRetry,
    /// No automatic recovery - user intervention required
    UserIntervention,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degrade => write!(f, "Continuing with reduced information"),
            Self::UseDefaults => write!(f, "Using defaults"),
            Self::SkipRecord => write!(f, "Skipping record"),
            Self::ExplicitRetry => write!(f, "Waiting for retry"),
            Self::UserIntervention => write!(f, "User intervention required"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be recovered from without user involvement
    Recoverable,
    /// Feature degraded but app can continue
    Degraded,
    /// Critical error requiring user action
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for Audiofolio
#[derive(Error, Debug)]
pub enum AppError {
    /// A book, chapter or file could not be found
    #[error("Not found: {entity} '{identifier}'")]
    NotFound { entity: String, identifier: String },

    /// The audio engine failed to open or play a file
    #[error("Engine failure on {file}: {message}")]
    EngineFailure { file: PathBuf, message: String },

    /// The preference store could not be read or written
    #[error("Persistence failure: {message}")]
    PersistenceFailure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A persisted record could not be parsed
    #[error("Malformed record '{record}': {reason}")]
    MalformedRecord { record: String, reason: String },

    /// Operation is not valid in the current state
    #[error("Invalid state: cannot {operation} while {state}")]
    InvalidState { operation: String, state: String },

    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// Permission denied for a file operation
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound { .. }
            | Self::PersistenceFailure { .. }
            | Self::MalformedRecord { .. } => ErrorSeverity::Recoverable,

            Self::EngineFailure { .. }
            | Self::InvalidState { .. }
            | Self::InvalidArgument { .. }
            | Self::IoError { .. } => ErrorSeverity::Degraded,

            Self::PermissionDenied { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::NotFound { .. } => RecoveryAction::Degrade,
            Self::PersistenceFailure { .. } => RecoveryAction::UseDefaults,
            Self::MalformedRecord { .. } => RecoveryAction::SkipRecord,
            Self::EngineFailure { .. } | Self::IoError { .. } => RecoveryAction::ExplicitRetry,
            Self::InvalidState { .. } | Self::InvalidArgument { .. } => RecoveryAction::Degrade,
            Self::PermissionDenied { .. } => RecoveryAction::UserIntervention,
        }
    }

    /// Returns a user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { entity, .. } => format!("The {} was not found.", entity),
            Self::EngineFailure { .. } => {
                "Cannot play this audio file. It may be corrupted or in an unsupported format."
                    .to_string()
            }
            Self::PersistenceFailure { .. } => {
                "Saved listening data could not be read. Defaults will be used.".to_string()
            }
            Self::MalformedRecord { .. } => "A saved record was damaged and skipped.".to_string(),
            Self::InvalidState { operation, .. } => {
                format!("Cannot {} right now.", operation)
            }
            Self::InvalidArgument { .. } => "Invalid input provided.".to_string(),
            Self::PermissionDenied { .. } => {
                "Permission denied. Please select the audiobook folder again.".to_string()
            }
            Self::IoError { .. } => "A file operation failed. Please try again.".to_string(),
        }
    }

    /// Returns true if this error needs an explicit user retry
    pub fn needs_retry(&self) -> bool {
        self.recovery_action() == RecoveryAction::ExplicitRetry
    }

    /// Helper to create a not-found error
    pub fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    /// Helper to create a persistence error from any error type
    pub fn persistence<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::PersistenceFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                entity: "file".to_string(),
                identifier: err.to_string(),
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: PathBuf::from("unknown"),
            },
            _ => Self::IoError {
                message: err.to_string(),
                source: err,
            },
        }
    }
}
