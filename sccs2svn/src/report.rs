//! Machine-readable results printed on stdout.

use serde::Serialize;
use std::path::Path;
use svn_repos::{format_svn_date, Revnum};

use crate::config::GroupingPolicy;
use crate::error::ConvertResult;
use crate::grouping::CommitGroup;

/// Counters collected while migrating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    /// Deltas replayed
    pub records: usize,
    /// Reconstructed commits
    pub commits: usize,
    /// Youngest revision after the migration
    pub revisions: Revnum,
    pub directories_created: usize,
    /// Files that received the text properties
    pub text_paths: usize,
    pub keyword_rewrites: usize,
    pub pruned: usize,
}

/// One file version inside a planned commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedFile {
    pub path: String,
    pub version: String,
}

/// A commit as it would be written, without touching any repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCommit {
    pub author: String,
    pub comment: String,
    pub date: String,
    pub files: Vec<PlannedFile>,
}

/// Output of a dry run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionPlan {
    pub records: usize,
    pub policy: GroupingPolicy,
    pub commits: Vec<PlannedCommit>,
}

impl ConversionPlan {
    pub fn build(
        groups: &[CommitGroup<'_>],
        root: &Path,
        policy: &GroupingPolicy,
    ) -> ConvertResult<Self> {
        let mut commits = Vec::with_capacity(groups.len());
        for group in groups {
            let mut files = Vec::with_capacity(group.len());
            for record in group.records() {
                files.push(PlannedFile {
                    path: record.target_path(root)?,
                    version: record.version().to_string(),
                });
            }
            commits.push(PlannedCommit {
                author: group.author().to_string(),
                comment: group.comment().to_string(),
                date: format_svn_date(&group.representative_timestamp()),
                files,
            });
        }

        Ok(Self {
            records: groups.iter().map(CommitGroup::len).sum(),
            policy: *policy,
            commits,
        })
    }

    pub fn to_json(&self) -> ConvertResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group_changes;
    use crate::record::ChangeRecord;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_plan_from_groups() {
        let at = |s: i64| Utc.timestamp_opt(1_131_667_200 + s, 0).unwrap();
        let records = vec![
            ChangeRecord::new("/r/proj/SCCS/s.a.c", "1.1", "ann", at(0), "import"),
            ChangeRecord::new("/r/proj/SCCS/s.b.c", "1.1", "ann", at(3), "import"),
            ChangeRecord::new("/r/SCCS/s.top.h", "1.4", "bob", at(60), "fix"),
        ];
        let policy = GroupingPolicy::default();
        let groups = group_changes(&records, &policy);
        let plan = ConversionPlan::build(&groups, Path::new("/r"), &policy).unwrap();

        assert_eq!(plan.records, 3);
        assert_eq!(plan.commits.len(), 2);
        assert_eq!(plan.commits[0].date, "2005-11-11T00:00:03.000000Z");
        assert_eq!(
            plan.commits[1].files,
            vec![PlannedFile {
                path: "top.h".to_string(),
                version: "1.4".to_string()
            }]
        );

        let json: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();
        assert_eq!(json["commits"][0]["files"][1]["path"], "proj/b.c");
        assert_eq!(json["policy"]["window_secs"], 10);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = MigrationSummary {
            records: 4,
            commits: 2,
            revisions: 5,
            ..Default::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["revisions"], 5);
        assert_eq!(json["pruned"], 0);
    }
}
