//! Reconstruction of multi-file commits from per-file deltas.
//!
//! SCCS records one delta per file and has no notion of a commit spanning
//! several files. Commits are rebuilt heuristically: after a stable
//! chronological sort, each delta joins the open group when it has the same
//! author and comment as the group's most recently added delta, touches a
//! different file, and lies within the configured time window of it.
//!
//! Only the last member is compared, so a long burst of related deltas
//! chains into a single group even when its first and last members are
//! further apart than the window.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;

use crate::config::GroupingPolicy;
use crate::record::ChangeRecord;

/// Deltas believed to form one atomic change.
///
/// Never empty; no two members share a source path.
#[derive(Debug, Clone)]
pub struct CommitGroup<'a> {
    records: Vec<&'a ChangeRecord>,
}

impl<'a> CommitGroup<'a> {
    fn seed(record: &'a ChangeRecord) -> Self {
        Self {
            records: vec![record],
        }
    }

    pub fn records(&self) -> &[&'a ChangeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First delta; supplies the commit's author and comment.
    pub fn first(&self) -> &'a ChangeRecord {
        self.records[0]
    }

    /// Most recently appended delta.
    pub fn last(&self) -> &'a ChangeRecord {
        self.records[self.records.len() - 1]
    }

    pub fn author(&self) -> &'a str {
        self.first().author()
    }

    pub fn comment(&self) -> &'a str {
        self.first().comment()
    }

    /// Date recorded for every revision made from this group: the
    /// timestamp of its last appended delta.
    pub fn representative_timestamp(&self) -> DateTime<Utc> {
        self.last().timestamp()
    }

    /// Consecutive slices of at most `max` deltas.
    pub fn batches(&self, max: usize) -> std::slice::Chunks<'_, &'a ChangeRecord> {
        self.records.chunks(max.max(1))
    }
}

impl GroupingPolicy {
    /// Whether `candidate` may be appended to a group whose last delta is `last`.
    pub fn matches(&self, candidate: &ChangeRecord, last: &ChangeRecord) -> bool {
        candidate.author() == last.author()
            && self.comments_match(candidate.comment(), last.comment())
            && candidate.path() != last.path()
            && (candidate.timestamp() - last.timestamp()).num_seconds().abs() < self.window_secs
    }
}

/// Sort by timestamp, keeping encounter order among equal timestamps.
pub fn sort_chronologically(records: &mut [ChangeRecord]) {
    records.sort_by_key(|r| r.timestamp());
}

/// Partition chronologically sorted deltas into commit groups.
///
/// Group order follows the position of each group's first delta.
pub fn group_changes<'a>(
    sorted: &'a [ChangeRecord],
    policy: &GroupingPolicy,
) -> Vec<CommitGroup<'a>> {
    let mut groups: Vec<CommitGroup<'a>> = Vec::new();
    // source paths of the open group
    let mut open_paths: HashSet<&'a Path> = HashSet::new();

    for record in sorted {
        let joins = match groups.last() {
            Some(open) => {
                policy.matches(record, open.last()) && !open_paths.contains(record.path())
            }
            None => false,
        };

        if joins {
            if let Some(open) = groups.last_mut() {
                open.records.push(record);
            }
        } else {
            open_paths.clear();
            groups.push(CommitGroup::seed(record));
        }
        open_paths.insert(record.path());
    }

    groups
}

/// Sort `records` in place and group them.
pub fn reconstruct_commits<'a>(
    records: &'a mut [ChangeRecord],
    policy: &GroupingPolicy,
) -> Vec<CommitGroup<'a>> {
    sort_chronologically(records);
    let records: &'a [ChangeRecord] = records;
    let groups = group_changes(records, policy);
    tracing::info!(
        "Consolidated {} versions into {} commits",
        records.len(),
        groups.len()
    );
    groups
}
