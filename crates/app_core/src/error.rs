//! Application error types

use std::path::PathBuf;
use thiserror::Error;

/// Session construction errors. Every variant aborts startup; per-image
/// failures are `app_fs::MoveError` and are reported through the observer.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directory not found: {0}")]
    NotFound(PathBuf),

    #[error("No albums found in {0}")]
    EmptyAlbumSet(PathBuf),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(path) => format!("Folder does not exist: {}", path.display()),
            AppError::EmptyAlbumSet(path) => {
                format!("{} has no album folders to file into", path.display())
            }
            _ => self.to_string(),
        }
    }
}

impl From<app_fs::FsError> for AppError {
    fn from(e: app_fs::FsError) -> Self {
        match e {
            app_fs::FsError::NotFound(p) => AppError::NotFound(PathBuf::from(p)),
            app_fs::FsError::InvalidPath(msg) => AppError::Config(msg),
            app_fs::FsError::Io(e) => AppError::Io(e),
        }
    }
}
