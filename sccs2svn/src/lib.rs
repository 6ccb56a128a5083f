//! sccs2svn
//!
//! Converts a tree of SCCS-controlled directories into a single Subversion
//! repository. Per-file SCCS deltas are regrouped into multi-file commits
//! and replayed in chronological order, followed by property, keyword and
//! pruning sweeps.

pub mod applier;
pub mod config;
pub mod convert;
pub mod error;
pub mod grouping;
pub mod keywords;
pub mod record;
pub mod report;
pub mod sccs;
pub mod walker;

pub use applier::Applier;
pub use config::{BatchLimits, CommentMatch, ConvertConfig, GroupingPolicy, TimestampZone};
pub use error::{ConvertError, ConvertResult};
pub use grouping::{group_changes, reconstruct_commits, sort_chronologically, CommitGroup};
pub use record::ChangeRecord;
pub use report::{ConversionPlan, MigrationSummary};
pub use sccs::{HistorySource, SccsExecutor};
pub use walker::RepositoryWalker;
