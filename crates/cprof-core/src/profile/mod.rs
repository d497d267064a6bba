//! Profile types and operations

pub mod snapshot;
pub mod storage;
mod types;

pub use snapshot::{snapshot_from_state, snapshot_live};
pub use storage::{load_file, ProfileStore};
pub use types::*;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for profile operations
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors from loading or saving profiles
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No stored profile with this name
    #[error("Profile '{0}' not found")]
    NotFound(String),

    /// A profile with this name already exists
    #[error("Profile '{0}' already exists")]
    AlreadyExists(String),

    /// Name is not usable as a file name
    #[error("Invalid profile name: '{0}'")]
    InvalidName(String),

    /// File I/O error
    #[error("I/O error for {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// JSON parse or serialize error
    #[error("JSON error in {path}: {message}")]
    Json { path: PathBuf, message: String },
}

impl ProfileError {
    pub(crate) fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn json(path: &Path, err: &serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
