//! Error types for config file writes

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for config file operations
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors that can occur while reading or writing config files
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File I/O error
    #[error("I/O error for {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// JSON parse error
    #[error("JSON parse error in {path}: {message}")]
    JsonParse { path: PathBuf, message: String },

    /// The document root is not a JSON object
    #[error("Expected a JSON object in {path}")]
    NotAnObject { path: PathBuf },

    /// Path resolution failed
    #[error(transparent)]
    Scan(#[from] cprof_scanner::ScanError),
}

impl SettingsError {
    pub(crate) fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn json(path: &Path, err: &serde_json::Error) -> Self {
        Self::JsonParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
