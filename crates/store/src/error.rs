//! Store error types

use audiofolio_core::AppError;
use std::path::PathBuf;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),

    /// A record field contains the record separator
    #[error("Cannot store {field} '{value}': contains the record separator")]
    Unencodable { field: &'static str, value: String },

    /// Writes are disabled (in-memory store in failure mode)
    #[error("Store is unavailable")]
    Unavailable,
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unencodable { field, value } => AppError::InvalidArgument {
                argument: field.to_string(),
                reason: format!("'{}' contains the record separator", value),
            },
            other => AppError::persistence(other.to_string(), other),
        }
    }
}
