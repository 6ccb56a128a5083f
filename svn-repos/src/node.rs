//! Node kinds, property names and repository path helpers

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{RepoError, Result};

/// Revision number
pub type Revnum = u64;

/// Versioned properties of a node or revision, kept sorted so
/// serialized property blocks are stable
pub type Props = BTreeMap<String, String>;

/// Revision property holding the commit author
pub const PROP_REVISION_AUTHOR: &str = "svn:author";
/// Revision property holding the commit date
pub const PROP_REVISION_DATE: &str = "svn:date";
/// Revision property holding the log message
pub const PROP_REVISION_LOG: &str = "svn:log";
/// Node property listing keywords to expand
pub const PROP_KEYWORDS: &str = "svn:keywords";
/// Node property controlling line ending translation
pub const PROP_EOL_STYLE: &str = "svn:eol-style";

/// Kind of a node as seen through `check_path`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Nothing exists at the path
    None,
    /// Versioned file
    File,
    /// Versioned directory
    Dir,
}

impl NodeKind {
    /// Dumpfile `Node-kind` value
    pub fn as_dump_str(&self) -> Option<&'static str> {
        match self {
            NodeKind::File => Some("file"),
            NodeKind::Dir => Some("dir"),
            NodeKind::None => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::None => write!(f, "nothing"),
            NodeKind::File => write!(f, "a file"),
            NodeKind::Dir => write!(f, "a directory"),
        }
    }
}

/// State of an existing node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub props: Props,
}

impl Node {
    pub fn dir() -> Self {
        Self {
            kind: NodeKind::Dir,
            props: Props::new(),
        }
    }

    pub fn file() -> Self {
        Self {
            kind: NodeKind::File,
            props: Props::new(),
        }
    }
}

/// Normalize a repository path: strip surrounding slashes and reject
/// empty, `.` and `..` components.
///
/// The repository root is the empty string.
pub fn canonicalize(path: &str) -> Result<String> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    for component in trimmed.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(RepoError::invalid_path(path));
        }
    }
    Ok(trimmed.to_string())
}

/// Parent directory of a canonical path (`None` for the root)
pub fn parent(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rsplit_once('/').map_or("", |(dir, _)| dir))
}

/// Final component of a canonical path
pub fn basename(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Whether `path` lies strictly inside directory `dir`
pub fn is_descendant(path: &str, dir: &str) -> bool {
    if dir.is_empty() {
        return !path.is_empty();
    }
    path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
}

/// Format a timestamp the way Subversion stores `svn:date`
pub fn format_svn_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("/proj/src/").unwrap(), "proj/src");
        assert_eq!(canonicalize("/").unwrap(), "");
        assert!(canonicalize("proj//src").is_err());
        assert!(canonicalize("proj/../etc").is_err());
    }

    #[test]
    fn test_parent_and_basename() {
        assert_eq!(parent("proj/src/main.c"), Some("proj/src"));
        assert_eq!(parent("proj"), Some(""));
        assert_eq!(parent(""), None);
        assert_eq!(basename("proj/src/main.c"), "main.c");
        assert_eq!(basename("proj"), "proj");
    }

    #[test]
    fn test_is_descendant() {
        assert!(is_descendant("proj/src", "proj"));
        assert!(!is_descendant("project", "proj"));
        assert!(!is_descendant("proj", "proj"));
        assert!(is_descendant("proj", ""));
    }

    #[test]
    fn test_format_svn_date() {
        let date = Utc.with_ymd_and_hms(2005, 11, 13, 9, 5, 7).unwrap();
        assert_eq!(format_svn_date(&date), "2005-11-13T09:05:07.000000Z");
    }
}
