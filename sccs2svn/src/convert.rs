//! End-to-end conversion steps shared by the command line front-end.

use std::path::Path;
use svn_repos::{Repository, RevisionSink};

use crate::applier::Applier;
use crate::config::ConvertConfig;
use crate::error::{ConvertError, ConvertResult};
use crate::grouping::reconstruct_commits;
use crate::record::ChangeRecord;
use crate::report::{ConversionPlan, MigrationSummary};
use crate::sccs::HistorySource;
use crate::walker::RepositoryWalker;

/// Fail when anything already exists at the target location.
pub fn ensure_target_absent(target: &Path) -> ConvertResult<()> {
    if target.exists() {
        return Err(ConvertError::TargetExists(target.to_path_buf()));
    }
    Ok(())
}

/// Read every delta below the configured root.
pub fn read_history<H: HistorySource>(
    config: &ConvertConfig,
    source: &H,
) -> ConvertResult<Vec<ChangeRecord>> {
    config.validate()?;
    RepositoryWalker::new(config, source).walk()
}

/// Group `records` into commits and describe them without writing anything.
pub fn plan(config: &ConvertConfig, records: &mut [ChangeRecord]) -> ConvertResult<ConversionPlan> {
    let groups = reconstruct_commits(records, &config.grouping);
    ConversionPlan::build(&groups, &config.sccs_root, &config.grouping)
}

/// Group `records` into commits and replay them into `repo`.
pub fn migrate<H: HistorySource, S: RevisionSink>(
    config: &ConvertConfig,
    source: &H,
    records: &mut [ChangeRecord],
    repo: &mut Repository<S>,
) -> ConvertResult<MigrationSummary> {
    let groups = reconstruct_commits(records, &config.grouping);
    Applier::new(config, source, repo)?.migrate(&groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimestampZone;
    use crate::sccs::{KeywordMode, SccsError, DELTA_MARKER, END_MARKER};
    use std::fs;
    use svn_repos::MemorySink;

    /// Each s-file holds two deltas; contents name the file and version.
    struct TwoDeltas;

    impl HistorySource for TwoDeltas {
        fn log(&self, _: &Path) -> Result<String, SccsError> {
            Ok(format!(
                "{m}\tD\t1.2\tann\t05/11/13\t10:00:30\ntidy\n{e}\n\
                 {m}\tD\t1.1\tann\t05/11/13\t10:00:00\nimport\n{e}\n",
                m = DELTA_MARKER,
                e = END_MARKER
            ))
        }

        fn contents(&self, record: &ChangeRecord, _: KeywordMode) -> Result<Vec<u8>, SccsError> {
            Ok(format!("{:?} {}", record.file_name(), record.version()).into_bytes())
        }
    }

    fn tree() -> (tempfile::TempDir, ConvertConfig) {
        let dir = tempfile::tempdir().unwrap();
        for sfile in ["proj/SCCS/s.a.c", "proj/SCCS/s.b.c"] {
            let path = dir.path().join(sfile);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"").unwrap();
        }
        let config = ConvertConfig {
            sccs_root: dir.path().to_path_buf(),
            timezone: TimestampZone::Utc,
            ..Default::default()
        };
        (dir, config)
    }

    #[test]
    fn test_plan_groups_across_files() {
        let (_dir, config) = tree();
        let mut records = read_history(&config, &TwoDeltas).unwrap();
        let planned = plan(&config, &mut records).unwrap();

        assert_eq!(planned.records, 4);
        assert_eq!(planned.commits.len(), 2);
        assert_eq!(planned.commits[0].comment, "import\n");
        assert_eq!(planned.commits[0].files.len(), 2);
        assert_eq!(planned.commits[1].date, "2005-11-13T10:00:30.000000Z");
    }

    #[test]
    fn test_migrate_into_memory() {
        let (_dir, config) = tree();
        let mut records = read_history(&config, &TwoDeltas).unwrap();
        let mut repo = Repository::new(MemorySink::new());
        let summary = migrate(&config, &TwoDeltas, &mut records, &mut repo).unwrap();

        // directory, two content commits, properties
        assert_eq!(summary.revisions, 4);
        assert_eq!(summary.commits, 2);
        assert_eq!(repo.youngest_rev(), 4);
        assert_eq!(repo.sink().revisions()[2].log, "tidy\n");
    }

    #[test]
    fn test_invalid_config_before_walk() {
        let (_dir, mut config) = tree();
        config.batches.content = 0;
        let err = read_history(&config, &TwoDeltas).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn test_existing_target_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_target_absent(dir.path()).unwrap_err();
        assert!(matches!(err, ConvertError::TargetExists(ref p) if p == dir.path()));

        let file = dir.path().join("dump");
        fs::write(&file, b"").unwrap();
        assert!(matches!(
            ensure_target_absent(&file),
            Err(ConvertError::TargetExists(_))
        ));

        assert!(ensure_target_absent(&dir.path().join("fresh")).is_ok());
    }
}
