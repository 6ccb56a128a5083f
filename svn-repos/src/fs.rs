//! Transactional repository filesystem
//!
//! [`Repository`] tracks the committed node tree (kinds and properties, not
//! contents) so that transactions can be validated the way the Subversion
//! filesystem validates them. Changes accumulate in a [`Transaction`] and
//! reach the [`RevisionSink`] only when the transaction is committed, so an
//! abandoned transaction leaves no trace.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::dump::{NodeAction, NodeChange, Revision, RevisionSink};
use crate::error::{RepoError, Result};
use crate::node::{self, Node, NodeKind, Revnum};

/// Pending changes against one base revision
#[derive(Debug)]
pub struct Transaction {
    base: Revnum,
    author: String,
    log: String,
    changes: Vec<NodeChange>,
    /// Position in `changes` of the live record for a path
    index: HashMap<String, usize>,
    /// Node state after this transaction; `None` marks a removal
    overlay: BTreeMap<String, Option<Node>>,
    /// Committed subtrees removed by this transaction
    deleted: BTreeSet<String>,
}

impl Transaction {
    pub fn base_revision(&self) -> Revnum {
        self.base
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    /// True when nothing has been changed yet
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn push(&mut self, change: NodeChange) {
        let path = change.path.clone();
        self.changes.push(change);
        self.index.insert(path, self.changes.len() - 1);
    }
}

/// A repository receiving revisions through a sink
pub struct Repository<S: RevisionSink> {
    sink: S,
    youngest: Revnum,
    tree: BTreeMap<String, Node>,
}

impl<S: RevisionSink> Repository<S> {
    /// Create an empty repository (youngest revision 0) writing to `sink`
    pub fn new(sink: S) -> Self {
        let mut tree = BTreeMap::new();
        tree.insert(String::new(), Node::dir());
        Self {
            sink,
            youngest: 0,
            tree,
        }
    }

    pub fn youngest_rev(&self) -> Revnum {
        self.youngest
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Committed state of a path
    pub fn node(&self, path: &str) -> Option<&Node> {
        self.tree.get(path.trim_matches('/'))
    }

    /// Open a transaction against the youngest revision
    pub fn begin_txn(&self, author: &str, log: &str) -> Transaction {
        Transaction {
            base: self.youngest,
            author: author.to_string(),
            log: log.to_string(),
            changes: Vec::new(),
            index: HashMap::new(),
            overlay: BTreeMap::new(),
            deleted: BTreeSet::new(),
        }
    }

    /// Kind of the node at `path` as seen from inside `txn`
    pub fn check_path(&self, txn: &Transaction, path: &str) -> Result<NodeKind> {
        let path = node::canonicalize(path)?;
        Ok(self.lookup(txn, &path).map_or(NodeKind::None, |n| n.kind))
    }

    pub fn make_dir(&self, txn: &mut Transaction, path: &str) -> Result<()> {
        self.add_node(txn, path, Node::dir())
    }

    pub fn make_file(&self, txn: &mut Transaction, path: &str) -> Result<()> {
        self.add_node(txn, path, Node::file())
    }

    /// Replace the full contents of a file
    pub fn apply_text(&self, txn: &mut Transaction, path: &str, contents: Vec<u8>) -> Result<()> {
        let path = node::canonicalize(path)?;
        let existing = self
            .lookup(txn, &path)
            .cloned()
            .ok_or_else(|| RepoError::not_found(path.as_str()))?;
        if existing.kind != NodeKind::File {
            return Err(RepoError::NotAFile(path));
        }

        match txn.index.get(&path) {
            Some(&i) => txn.changes[i].text = Some(contents),
            None => {
                txn.push(NodeChange {
                    path: path.clone(),
                    kind: NodeKind::File,
                    action: NodeAction::Change,
                    props: None,
                    text: Some(contents),
                });
            }
        }
        txn.overlay.insert(path, Some(existing));
        Ok(())
    }

    /// Set (`Some`) or remove (`None`) a node property
    pub fn change_node_prop(
        &self,
        txn: &mut Transaction,
        path: &str,
        name: &str,
        value: Option<&str>,
    ) -> Result<()> {
        let path = node::canonicalize(path)?;
        let mut updated = self
            .lookup(txn, &path)
            .cloned()
            .ok_or_else(|| RepoError::not_found(path.as_str()))?;
        match value {
            Some(value) => {
                updated.props.insert(name.to_string(), value.to_string());
            }
            None => {
                updated.props.remove(name);
            }
        }

        match txn.index.get(&path) {
            Some(&i) => txn.changes[i].props = Some(updated.props.clone()),
            None => {
                txn.push(NodeChange {
                    path: path.clone(),
                    kind: updated.kind,
                    action: NodeAction::Change,
                    props: Some(updated.props.clone()),
                    text: None,
                });
            }
        }
        txn.overlay.insert(path, Some(updated));
        Ok(())
    }

    /// Remove a node; directories are removed with their contents
    pub fn delete(&self, txn: &mut Transaction, path: &str) -> Result<()> {
        let path = node::canonicalize(path)?;
        if path.is_empty() {
            return Err(RepoError::invalid_path("/"));
        }
        let existing = self
            .lookup(txn, &path)
            .ok_or_else(|| RepoError::not_found(path.as_str()))?;
        let kind = existing.kind;

        txn.index
            .retain(|p, _| p != &path && !node::is_descendant(p, &path));
        txn.overlay
            .retain(|p, _| p != &path && !node::is_descendant(p, &path));
        txn.changes.push(NodeChange {
            path: path.clone(),
            kind,
            action: NodeAction::Delete,
            props: None,
            text: None,
        });
        txn.overlay.insert(path.clone(), None);
        txn.deleted.insert(path);
        Ok(())
    }

    /// Commit `txn` as the next revision, recorded at `date`
    pub fn commit_txn(&mut self, txn: Transaction, date: DateTime<Utc>) -> Result<Revnum> {
        if txn.base != self.youngest {
            return Err(RepoError::TxnOutOfDate {
                base: txn.base,
                youngest: self.youngest,
            });
        }

        let Transaction {
            author,
            log,
            changes,
            overlay,
            deleted,
            ..
        } = txn;

        let revision = Revision {
            number: self.youngest + 1,
            author,
            log,
            date,
            changes,
        };
        self.sink.write_revision(&revision)?;

        for path in &deleted {
            self.remove_subtree(path);
        }
        for (path, state) in overlay {
            match state {
                Some(node) => {
                    self.tree.insert(path, node);
                }
                None => {
                    self.tree.remove(&path);
                }
            }
        }

        self.youngest = revision.number;
        log::debug!(
            "Committed r{} ({} node changes)",
            revision.number,
            revision.changes.len()
        );
        Ok(self.youngest)
    }

    /// Discard a transaction without writing anything
    pub fn abort_txn(&self, txn: Transaction) {
        log::debug!(
            "Aborted transaction on r{} ({} pending changes)",
            txn.base,
            txn.changes.len()
        );
    }

    fn add_node(&self, txn: &mut Transaction, path: &str, new_node: Node) -> Result<()> {
        let path = node::canonicalize(path)?;
        if let Some(existing) = self.lookup(txn, &path) {
            return Err(RepoError::conflict(path, existing.kind));
        }
        let parent = node::parent(&path).unwrap_or_default();
        match self.lookup(txn, parent) {
            Some(n) if n.kind == NodeKind::Dir => {}
            _ => return Err(RepoError::ParentNotDirectory(path)),
        }

        txn.push(NodeChange {
            path: path.clone(),
            kind: new_node.kind,
            action: NodeAction::Add,
            props: Some(new_node.props.clone()),
            text: None,
        });
        txn.overlay.insert(path, Some(new_node));
        Ok(())
    }

    fn lookup<'a>(&'a self, txn: &'a Transaction, path: &str) -> Option<&'a Node> {
        if let Some(state) = txn.overlay.get(path) {
            return state.as_ref();
        }
        let hidden = txn
            .deleted
            .iter()
            .any(|d| d == path || node::is_descendant(path, d));
        if hidden {
            return None;
        }
        self.tree.get(path)
    }

    fn remove_subtree(&mut self, path: &str) {
        let prefix = format!("{}/", path);
        let doomed: Vec<String> = self
            .tree
            .range(prefix.clone()..)
            .take_while(|(p, _)| p.starts_with(&prefix))
            .map(|(p, _)| p.clone())
            .collect();
        for p in doomed {
            self.tree.remove(&p);
        }
        self.tree.remove(path);
    }
}
