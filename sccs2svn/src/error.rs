//! Error types for the converter.

use crate::sccs::SccsError;
use std::path::PathBuf;
use svn_repos::RepoError;
use thiserror::Error;

/// Errors that can occur during a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Repository directory {0} already exists")]
    TargetExists(PathBuf),

    #[error("SCCS root {0} is not a directory")]
    SourceNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unable to read any SCCS versions under {0}; nothing to convert")]
    EmptyHistory(PathBuf),

    #[error("Not an SCCS history file below the root: {0}")]
    InvalidRecordPath(PathBuf),

    #[error("Invalid text pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("Invalid keyword rule: {0}")]
    Regex(#[from] regex::Error),

    #[error("SCCS error: {0}")]
    Sccs(#[from] SccsError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepoError),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
