//! Replays reconstructed commits into the target repository.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use svn_repos::{
    format_svn_date, node, NodeKind, RepoError, Repository, RevisionSink, Transaction,
    PROP_EOL_STYLE, PROP_KEYWORDS,
};

use crate::config::{BatchLimits, ConvertConfig};
use crate::error::ConvertResult;
use crate::grouping::CommitGroup;
use crate::keywords::{KeywordTranslator, TextClassifier, EOL_STYLE_VALUE, KEYWORDS_VALUE};
use crate::record::ChangeRecord;
use crate::report::MigrationSummary;
use crate::sccs::{HistorySource, KeywordMode};

const DIRECTORY_LOG: &str = "Automatic directory addition";
const PROPERTY_LOG: &str = "Automated property set";
const KEYWORD_LOG: &str = "Automated keyword replacement";
const PRUNE_LOG: &str = "Automated SCCS conversion removal";

/// Writes commit groups and the follow-up sweeps into a repository.
pub struct Applier<'a, H: HistorySource, S: RevisionSink> {
    repo: &'a mut Repository<S>,
    source: &'a H,
    root: PathBuf,
    operator: String,
    batches: BatchLimits,
    classifier: TextClassifier,
    translator: Option<KeywordTranslator>,
    prune_suffix: Option<String>,
    /// Directories known to exist in the repository
    created_dirs: HashSet<String>,
    summary: MigrationSummary,
}

impl<'a, H: HistorySource, S: RevisionSink> Applier<'a, H, S> {
    pub fn new(
        config: &ConvertConfig,
        source: &'a H,
        repo: &'a mut Repository<S>,
    ) -> ConvertResult<Self> {
        let translator = if config.translate_keywords {
            Some(KeywordTranslator::new()?)
        } else {
            None
        };

        Ok(Self {
            repo,
            source,
            root: config.sccs_root.clone(),
            operator: config.operator.clone(),
            batches: config.batches,
            classifier: TextClassifier::new(&config.text_patterns)?,
            translator,
            prune_suffix: config.prune_suffix.clone(),
            created_dirs: HashSet::new(),
            summary: MigrationSummary::default(),
        })
    }

    /// Apply every group in order, then run the sweeps over all paths.
    pub fn migrate(mut self, groups: &[CommitGroup<'_>]) -> ConvertResult<MigrationSummary> {
        // latest delta of every path, in path order
        let mut latest: BTreeMap<String, &ChangeRecord> = BTreeMap::new();

        for group in groups {
            self.apply_group(group)?;
            for record in group.records() {
                latest.insert(record.target_path(&self.root)?, *record);
            }
        }

        let sweep_date = Utc::now();
        let paths: Vec<String> = latest.keys().cloned().collect();
        self.property_sweep(&paths, sweep_date)?;

        if self.translator.is_some() {
            let latest: Vec<(String, &ChangeRecord)> = latest.into_iter().collect();
            self.keyword_sweep(&latest, sweep_date)?;
        }

        if self.prune_suffix.is_some() {
            self.prune_sweep(&paths, sweep_date)?;
        }

        self.summary.revisions = self.repo.youngest_rev();
        tracing::info!(
            "Migration complete: {} versions in {} commits, {} revisions",
            self.summary.records,
            self.summary.commits,
            self.summary.revisions
        );
        Ok(self.summary)
    }

    /// Commit one group, split into batches of at most the content limit.
    ///
    /// Every batch records the group's first author and comment and the
    /// group's representative timestamp.
    pub fn apply_group(&mut self, group: &CommitGroup<'_>) -> ConvertResult<()> {
        let date = group.representative_timestamp();
        if group.len() > self.batches.content {
            tracing::info!(
                "Partitioning {} deltas into batches of {}",
                group.len(),
                self.batches.content
            );
        }

        for batch in group.batches(self.batches.content) {
            // Directories go in first, in their own transaction
            self.ensure_directories(batch, date)?;

            let mut txn = self.repo.begin_txn(group.author(), group.comment());
            for record in batch {
                let path = record.target_path(&self.root)?;
                match self.repo.check_path(&txn, &path)? {
                    NodeKind::None => self.repo.make_file(&mut txn, &path)?,
                    NodeKind::Dir => return Err(RepoError::conflict(path, NodeKind::Dir).into()),
                    NodeKind::File => {}
                }
                let contents = self.source.contents(record, KeywordMode::Expanded)?;
                self.repo.apply_text(&mut txn, &path, contents)?;
                tracing::debug!("Sending {} {}", path, format_svn_date(&date));
            }

            let rev = self.repo.commit_txn(txn, date)?;
            tracing::info!(
                "Committed r{} ({} files by {})",
                rev,
                batch.len(),
                group.author()
            );
        }

        self.summary.records += group.len();
        self.summary.commits += 1;
        Ok(())
    }

    /// Create every directory the batch needs that does not exist yet.
    fn ensure_directories(
        &mut self,
        batch: &[&ChangeRecord],
        date: DateTime<Utc>,
    ) -> ConvertResult<()> {
        let mut wanted: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for record in batch {
            for dir in self.missing_directories(&record.target_dir(&self.root)?) {
                if seen.insert(dir.clone()) {
                    wanted.push(dir);
                }
            }
        }
        if wanted.is_empty() {
            return Ok(());
        }

        let mut txn = self.repo.begin_txn(&self.operator, DIRECTORY_LOG);
        for dir in &wanted {
            if self.repo.check_path(&txn, dir)? != NodeKind::Dir {
                tracing::info!("Adding directory {}", dir);
                self.repo.make_dir(&mut txn, dir)?;
                self.summary.directories_created += 1;
            }
        }
        if txn.is_empty() {
            self.repo.abort_txn(txn);
        } else {
            self.repo.commit_txn(txn, date)?;
        }

        self.created_dirs.extend(wanted);
        Ok(())
    }

    /// Ancestors of `dir` (and `dir` itself) not yet created, outermost first.
    fn missing_directories(&self, dir: &str) -> Vec<String> {
        let mut missing = Vec::new();
        let mut current = dir;
        while !current.is_empty() {
            if !self.created_dirs.contains(current) {
                missing.push(current.to_string());
            }
            current = node::parent(current).unwrap_or_default();
        }
        missing.reverse();
        missing
    }

    /// Set keyword and line ending properties on text files.
    pub fn property_sweep(&mut self, paths: &[String], date: DateTime<Utc>) -> ConvertResult<()> {
        if paths.len() > self.batches.properties {
            tracing::info!(
                "Partitioning {} paths into batches of {}",
                paths.len(),
                self.batches.properties
            );
        }

        for batch in paths.chunks(self.batches.properties.max(1)) {
            let mut txn = self.repo.begin_txn(&self.operator, PROPERTY_LOG);
            for path in batch {
                if self.classifier.is_text(path) {
                    tracing::debug!("Property set for {}", path);
                    self.repo
                        .change_node_prop(&mut txn, path, PROP_KEYWORDS, Some(KEYWORDS_VALUE))?;
                    self.repo
                        .change_node_prop(&mut txn, path, PROP_EOL_STYLE, Some(EOL_STYLE_VALUE))?;
                    self.summary.text_paths += 1;
                } else {
                    tracing::debug!("Skipping property set for {}", path);
                }
            }
            self.finish_sweep_txn(txn, date)?;
        }
        Ok(())
    }

    /// Rewrite SCCS keywords in the latest contents of each text file.
    pub fn keyword_sweep(
        &mut self,
        latest: &[(String, &ChangeRecord)],
        date: DateTime<Utc>,
    ) -> ConvertResult<()> {
        let Some(translator) = self.translator.clone() else {
            return Ok(());
        };

        for batch in latest.chunks(self.batches.content.max(1)) {
            let mut txn = self.repo.begin_txn(&self.operator, KEYWORD_LOG);
            for (path, record) in batch {
                if !self.classifier.is_text(path) {
                    continue;
                }
                let original = self.source.contents(record, KeywordMode::Unexpanded)?;
                let translated = translator.translate(&original);
                if translated.as_ref() != original.as_slice() {
                    tracing::debug!("Sending keyword update for {}", path);
                    let updated = translated.into_owned();
                    self.repo.apply_text(&mut txn, path, updated)?;
                    self.summary.keyword_rewrites += 1;
                }
            }
            self.finish_sweep_txn(txn, date)?;
        }
        Ok(())
    }

    /// Remove files and directories whose names end with the prune suffix.
    pub fn prune_sweep(&mut self, paths: &[String], date: DateTime<Utc>) -> ConvertResult<()> {
        let Some(suffix) = self.prune_suffix.clone() else {
            return Ok(());
        };

        let candidates: BTreeSet<&str> = paths
            .iter()
            .map(String::as_str)
            .chain(self.created_dirs.iter().map(String::as_str))
            .filter(|p| node::basename(p).ends_with(suffix.as_str()))
            .collect();

        let mut doomed: Vec<&str> = Vec::new();
        for path in candidates {
            if doomed.iter().any(|d| node::is_descendant(path, d)) {
                continue;
            }
            doomed.push(path);
        }
        if doomed.is_empty() {
            return Ok(());
        }

        let mut txn = self.repo.begin_txn(&self.operator, PRUNE_LOG);
        for path in &doomed {
            tracing::info!("Removing {}", path);
            self.repo.delete(&mut txn, path)?;
        }
        self.repo.commit_txn(txn, date)?;
        self.summary.pruned += doomed.len();
        Ok(())
    }

    /// Commit a sweep transaction, or abort it when it changed nothing.
    fn finish_sweep_txn(&mut self, txn: Transaction, date: DateTime<Utc>) -> ConvertResult<()> {
        if txn.is_empty() {
            tracing::debug!("Nothing to commit for \"{}\"", txn.log());
            self.repo.abort_txn(txn);
        } else {
            let log = txn.log().to_string();
            let rev = self.repo.commit_txn(txn, date)?;
            tracing::info!("Committed r{} ({})", rev, log);
        }
        Ok(())
    }
}
