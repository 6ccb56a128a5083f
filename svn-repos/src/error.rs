//! Error types for svn-repos

use thiserror::Error;

use crate::node::NodeKind;

/// Errors that can occur while writing a repository
#[derive(Debug, Error)]
pub enum RepoError {
    /// Path already exists with a kind that forbids the operation
    #[error("Path conflict: '{path}' already present as {existing}")]
    PathConflict { path: String, existing: NodeKind },

    /// Path does not exist in the transaction
    #[error("Path not found: '{0}'")]
    PathNotFound(String),

    /// Parent of a new node is missing or is a file
    #[error("Parent of '{0}' is not a directory")]
    ParentNotDirectory(String),

    /// Text can only be applied to files
    #[error("Not a file: '{0}'")]
    NotAFile(String),

    /// Transaction was opened against a revision that is no longer youngest
    #[error("Transaction based on r{base} is out of date (youngest is r{youngest})")]
    TxnOutOfDate { base: u64, youngest: u64 },

    /// Invalid repository path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// svnadmin invocation failed
    #[error("svnadmin failed: {0}")]
    CommandFailed(String),

    /// svnadmin is missing
    #[error("svnadmin is not available on this system")]
    SvnAdminNotAvailable,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepoError {
    /// Create a path conflict error
    pub fn conflict(path: impl Into<String>, existing: NodeKind) -> Self {
        Self::PathConflict {
            path: path.into(),
            existing,
        }
    }

    /// Create a not found error
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_conflict_display() {
        let err = RepoError::conflict("trunk/Makefile", NodeKind::Dir);
        assert_eq!(
            err.to_string(),
            "Path conflict: 'trunk/Makefile' already present as a directory"
        );
    }

    #[test]
    fn test_out_of_date_display() {
        let err = RepoError::TxnOutOfDate {
            base: 3,
            youngest: 4,
        };
        assert_eq!(
            err.to_string(),
            "Transaction based on r3 is out of date (youngest is r4)"
        );
    }
}
