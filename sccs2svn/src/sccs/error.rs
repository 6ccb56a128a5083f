//! Error types for SCCS operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading SCCS history.
#[derive(Error, Debug)]
pub enum SccsError {
    #[error("SCCS is not available on this system ({0})")]
    SccsNotAvailable(String),

    #[error("SCCS command failed for {path}: {stderr}")]
    CommandFailed { path: PathBuf, stderr: String },

    #[error("Failed to fetch {path} at version {version}: {reason}")]
    ContentFetch {
        path: PathBuf,
        version: String,
        reason: String,
    },

    #[error("Failed to parse SCCS log of {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SccsError {
    pub(crate) fn parse(path: &std::path::Path, reason: impl Into<String>) -> Self {
        SccsError::ParseError {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}
