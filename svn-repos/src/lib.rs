//! Subversion repository writer
//!
//! Writes Subversion history through the repository layer rather than a
//! working copy, so that revision authors and dates can be set to any value.
//!
//! ## Features
//!
//! - **Transactions** - `begin_txn` / `make_dir` / `make_file` / `apply_text` /
//!   `change_node_prop` / `delete` / `commit_txn`, validated against the
//!   committed node tree
//! - **Dumpfile output** - committed revisions stream out in dumpfile format 2
//! - **svnadmin** - create a repository and load the stream into it
//!
//! ## Example
//!
//! ```ignore
//! use svn_repos::{DumpWriter, Repository, SvnAdmin};
//!
//! let admin = SvnAdmin::new("svnadmin")?;
//! admin.create(&path)?;
//! let mut repo = Repository::new(DumpWriter::new(admin.load(&path)?));
//!
//! let mut txn = repo.begin_txn("ann", "Initial import");
//! repo.make_dir(&mut txn, "proj")?;
//! repo.commit_txn(txn, date)?;
//!
//! repo.into_sink().into_inner()?.finish()?;
//! ```

pub mod admin;
pub mod dump;
pub mod error;
pub mod fs;
pub mod node;

// Re-exports for convenience
pub use admin::{LoadProcess, SvnAdmin};
pub use dump::{DumpWriter, MemorySink, NodeAction, NodeChange, Revision, RevisionSink};
pub use error::RepoError;
pub use fs::{Repository, Transaction};
pub use node::{
    format_svn_date, Node, NodeKind, Props, Revnum, PROP_EOL_STYLE, PROP_KEYWORDS,
    PROP_REVISION_AUTHOR, PROP_REVISION_DATE, PROP_REVISION_LOG,
};
