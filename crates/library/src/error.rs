// FILE: crates/library/src/error.rs

use audiofolio_core::error::AppError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Folder not found: {0}")]
    NotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Directory walk failed: {0}")]
    Walk(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    /// Missing or revoked folders both read as "not there"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LibraryError::NotFound(_) | LibraryError::PermissionDenied(_)
        )
    }

    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => LibraryError::NotFound(path),
            std::io::ErrorKind::PermissionDenied => LibraryError::PermissionDenied(path),
            _ => LibraryError::Io(err),
        }
    }
}

impl From<walkdir::Error> for LibraryError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf());
        match (err.into_io_error(), path) {
            (Some(io), Some(path)) => LibraryError::from_io(path, io),
            (Some(io), None) => LibraryError::Io(io),
            (None, _) => LibraryError::Walk("filesystem loop detected".to_string()),
        }
    }
}

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::NotFound(path) | LibraryError::NotADirectory(path) => {
                AppError::not_found("folder", path.display().to_string())
            }
            LibraryError::PermissionDenied(path) => AppError::PermissionDenied { path },
            LibraryError::Io(e) => AppError::from(e),
            LibraryError::Walk(message) => AppError::IoError {
                source: std::io::Error::other(message.clone()),
                message,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
