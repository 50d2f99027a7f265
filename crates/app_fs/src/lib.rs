//! ImageSack File System Layer
//!
//! Provides the file system operations the dispatch engine depends on:
//! - Directory listing with hidden/extension filtering and byte-order sorting
//! - FileMover: collision-safe, at-most-once move and trash operations

mod browser;
mod file_operations;

pub use browser::{FileEntry, ListOptions, list_directory};
pub use file_operations::{
    checksum, DefaultFileMover, FileMover, MoveError, TrashTarget, VerifyMode,
};

use thiserror::Error;

/// File system errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, FsError>;
