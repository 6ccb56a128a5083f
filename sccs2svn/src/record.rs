//! One historical revision of one SCCS file.

use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};

use crate::error::{ConvertError, ConvertResult};

/// Prefix SCCS puts in front of every history file name.
pub const SFILE_PREFIX: &str = "s.";

/// Name of the directories SCCS keeps history files in.
pub const SCCS_DIR_NAME: &str = "SCCS";

/// A single delta read from an SCCS history file.
///
/// Fields are fixed at construction; every path derived from a record is a
/// pure function of these fields and the SCCS root it was found under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    path: PathBuf,
    version: String,
    author: String,
    timestamp: DateTime<Utc>,
    comment: String,
}

impl ChangeRecord {
    pub fn new(
        path: impl Into<PathBuf>,
        version: impl Into<String>,
        author: impl Into<String>,
        timestamp: DateTime<Utc>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
            author: author.into(),
            timestamp,
            comment: comment.into(),
        }
    }

    /// Path of the s-file this delta came from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// SCCS id (SID) of the delta
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Directory holding the s-file
    pub fn sccs_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Working file name, without the `s.` prefix
    pub fn file_name(&self) -> Option<&str> {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(SFILE_PREFIX))
            .filter(|n| !n.is_empty())
    }

    /// Repository directory for this file, relative to the repository root
    /// (empty for the root itself)
    pub fn target_dir(&self, root: &Path) -> ConvertResult<String> {
        let relative = self
            .path
            .strip_prefix(root)
            .map_err(|_| self.invalid())?;
        let sccs_dir = relative.parent().ok_or_else(|| self.invalid())?;
        if sccs_dir.file_name().and_then(|n| n.to_str()) != Some(SCCS_DIR_NAME) {
            return Err(self.invalid());
        }
        let working_dir = sccs_dir.parent().unwrap_or_else(|| Path::new(""));

        let mut parts = Vec::new();
        for component in working_dir.components() {
            match component {
                Component::Normal(part) => {
                    parts.push(part.to_str().ok_or_else(|| self.invalid())?.to_string())
                }
                Component::CurDir => {}
                _ => return Err(self.invalid()),
            }
        }
        Ok(parts.join("/"))
    }

    /// Repository path of the working file this delta belongs to
    pub fn target_path(&self, root: &Path) -> ConvertResult<String> {
        let dir = self.target_dir(root)?;
        let name = self.file_name().ok_or_else(|| self.invalid())?;
        if dir.is_empty() {
            Ok(name.to_string())
        } else {
            Ok(format!("{}/{}", dir, name))
        }
    }

    fn invalid(&self) -> ConvertError {
        ConvertError::InvalidRecordPath(self.path.clone())
    }
}
