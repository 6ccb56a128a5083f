//! Discovery of SCCS history files below a root directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{ConvertConfig, TimestampZone};
use crate::error::{ConvertError, ConvertResult};
use crate::record::{ChangeRecord, SCCS_DIR_NAME, SFILE_PREFIX};
use crate::sccs::{parse_prs_output, HistorySource};

/// Walks a tree of SCCS directories and reads every delta found.
pub struct RepositoryWalker<'a, H: HistorySource> {
    source: &'a H,
    root: PathBuf,
    zone: TimestampZone,
}

impl<'a, H: HistorySource> RepositoryWalker<'a, H> {
    pub fn new(config: &ConvertConfig, source: &'a H) -> Self {
        Self {
            source,
            root: config.sccs_root.clone(),
            zone: config.timezone,
        }
    }

    /// All s-files below the root, in file name order.
    pub fn sfiles(&self) -> ConvertResult<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && is_sfile(entry.path()) {
                found.push(entry.into_path());
            }
        }
        Ok(found)
    }

    /// Every delta of every s-file, in encounter order.
    ///
    /// Fails with [`ConvertError::EmptyHistory`] when nothing was found.
    pub fn walk(&self) -> ConvertResult<Vec<ChangeRecord>> {
        let mut records = Vec::new();
        let mut current_dir: Option<PathBuf> = None;

        for sfile in self.sfiles()? {
            if let Some(dir) = sfile.parent() {
                if current_dir.as_deref() != Some(dir) {
                    tracing::info!("Visiting {}", dir.display());
                    current_dir = Some(dir.to_path_buf());
                }
            }

            let log = self.source.log(&sfile)?;
            let parsed = parse_prs_output(&sfile, &log, self.zone)?;
            tracing::debug!("{}: {} deltas", sfile.display(), parsed.len());
            records.extend(parsed);
        }

        tracing::info!("Read {} versions", records.len());
        if records.is_empty() {
            return Err(ConvertError::EmptyHistory(self.root.clone()));
        }
        Ok(records)
    }
}

/// Whether `path` names an s-file inside an `SCCS` directory.
fn is_sfile(path: &Path) -> bool {
    let in_sccs_dir = path
        .parent()
        .and_then(|p| p.file_name())
        .is_some_and(|n| n == SCCS_DIR_NAME);
    let named_like_sfile = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.len() > SFILE_PREFIX.len() && n.starts_with(SFILE_PREFIX));
    in_sccs_dir && named_like_sfile
}
