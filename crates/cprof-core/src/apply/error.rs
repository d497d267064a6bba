//! Error types for apply operations

use cprof_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::SettingsError;
use crate::profile::ProfileError;
use crate::secrets::SecretError;

/// Result type for apply operations
pub type ApplyResult<T> = Result<T, ApplyError>;

/// Failures that stop an apply before (or instead of) any mutation
///
/// Per-item failures are not errors; they are collected in the report.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Invalid scope specified
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// Scope needs a project directory and none was given
    #[error("Scope '{0}' requires a project directory")]
    ProjectRequired(String),

    /// A required secret could not be resolved
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// Settings or record file could not be read or written
    #[error(transparent)]
    Settings(SettingsError),

    /// Live state could not be scanned
    #[error("Scanner error: {0}")]
    Scan(ScanError),

    /// Profile could not be loaded
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// No applied-profile record to sync from
    #[error("No applied profile record at {0}")]
    NoRecord(PathBuf),

    /// Worker pool could not be started
    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}

impl ApplyError {
    /// Get the error code for CLI/API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidScope(_) => "INVALID_SCOPE",
            Self::ProjectRequired(_) => "PROJECT_REQUIRED",
            Self::Secret(_) => "SECRET_UNRESOLVED",
            Self::Settings(_) => "SETTINGS_ERROR",
            Self::Scan(_) => "SCANNER_ERROR",
            Self::Profile(_) => "PROFILE_ERROR",
            Self::NoRecord(_) => "NO_RECORD",
            Self::WorkerPool(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<ScanError> for ApplyError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::InvalidScope(scope) => Self::InvalidScope(scope),
            ScanError::ProjectRequired(scope) => Self::ProjectRequired(scope),
            other => Self::Scan(other),
        }
    }
}

impl From<SettingsError> for ApplyError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Scan(scan) => Self::from(scan),
            other => Self::Settings(other),
        }
    }
}
