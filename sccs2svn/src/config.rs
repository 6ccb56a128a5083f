//! Conversion configuration.

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::error::{ConvertError, ConvertResult};

/// Maximum distance, in seconds, between two deltas chained into one commit.
pub const DEFAULT_WINDOW_SECS: i64 = 10;

/// Files written per content transaction.
pub const DEFAULT_CONTENT_BATCH: usize = 1000;

/// Paths touched per property transaction.
pub const DEFAULT_PROPERTY_BATCH: usize = 3000;

/// File name patterns treated as text.
pub const DEFAULT_TEXT_PATTERNS: &[&str] = &[
    "*.pm", "*.pl", "*.C", "*.h", "*.hpp", "*.inc", "*.c", "*.cpp", "*.java", "*.xml", "*.asm",
    "*.s", "*.S", "*akefile",
];

/// How SCCS wall-clock times are turned into instants.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampZone {
    /// Time zone of the machine running the conversion
    #[default]
    Local,
    /// Coordinated universal time
    Utc,
}

impl TimestampZone {
    pub fn resolve(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self {
            TimestampZone::Utc => Utc.from_utc_datetime(&naive),
            TimestampZone::Local => match Local.from_local_datetime(&naive) {
                LocalResult::Single(t) => t.with_timezone(&Utc),
                LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
                LocalResult::None => {
                    tracing::warn!("{} does not exist in the local time zone, using UTC", naive);
                    Utc.from_utc_datetime(&naive)
                }
            },
        }
    }
}

/// How commit comments are compared when grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentMatch {
    /// Byte-for-byte equality
    #[default]
    Exact,
    /// Equality after trimming surrounding whitespace
    Trimmed,
}

/// Heuristic deciding which deltas belong to one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupingPolicy {
    /// Consecutive deltas must be strictly closer than this many seconds.
    pub window_secs: i64,
    pub comment_match: CommentMatch,
}

impl Default for GroupingPolicy {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            comment_match: CommentMatch::Exact,
        }
    }
}

impl GroupingPolicy {
    pub fn comments_match(&self, a: &str, b: &str) -> bool {
        match self.comment_match {
            CommentMatch::Exact => a == b,
            CommentMatch::Trimmed => a.trim() == b.trim(),
        }
    }
}

/// Upper bounds on the size of a single transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchLimits {
    /// Files whose contents are sent in one transaction.
    pub content: usize,
    /// Paths whose properties are set in one transaction.
    pub properties: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            content: DEFAULT_CONTENT_BATCH,
            properties: DEFAULT_PROPERTY_BATCH,
        }
    }
}

/// Configuration for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Author recorded on revisions the converter makes on its own behalf.
    pub operator: String,
    /// Root of the tree holding the SCCS directories.
    pub sccs_root: PathBuf,
    pub grouping: GroupingPolicy,
    pub batches: BatchLimits,
    pub timezone: TimestampZone,
    /// Additional glob patterns for text files.
    pub text_patterns: Vec<String>,
    /// Whether SCCS keywords in text files are rewritten.
    pub translate_keywords: bool,
    /// Files and directories whose names end with this are removed at the end.
    pub prune_suffix: Option<String>,
    /// SCCS front-end program.
    pub sccs_program: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            operator: "sccs2svn".to_string(),
            sccs_root: PathBuf::from("."),
            grouping: GroupingPolicy::default(),
            batches: BatchLimits::default(),
            timezone: TimestampZone::Local,
            text_patterns: Vec::new(),
            translate_keywords: true,
            prune_suffix: None,
            sccs_program: "sccs".to_string(),
        }
    }
}

impl ConvertConfig {
    /// Check the configuration before anything is read or written.
    pub fn validate(&self) -> ConvertResult<()> {
        if self.operator.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "operator user id must not be empty".to_string(),
            ));
        }
        if !self.sccs_root.is_dir() {
            return Err(ConvertError::SourceNotFound(self.sccs_root.clone()));
        }
        if self.grouping.window_secs < 0 {
            return Err(ConvertError::InvalidConfig(
                "grouping window must not be negative".to_string(),
            ));
        }
        if self.batches.content == 0 || self.batches.properties == 0 {
            return Err(ConvertError::InvalidConfig(
                "batch sizes must be at least 1".to_string(),
            ));
        }
        if matches!(&self.prune_suffix, Some(s) if s.is_empty()) {
            return Err(ConvertError::InvalidConfig(
                "prune suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
