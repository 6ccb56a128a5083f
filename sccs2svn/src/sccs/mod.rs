//! SCCS history access.
//!
//! This module provides functionality to:
//! - Run the `sccs` front-end (`prs` for delta logs, `get` for contents)
//! - Parse `prs` output into change records

mod error;
mod executor;
mod parser;

pub use error::SccsError;
pub use executor::{HistorySource, KeywordMode, SccsExecutor};
pub use parser::{parse_prs_output, DELTA_MARKER, END_MARKER, PRS_FORMAT};

#[cfg(all(test, unix))]
pub(crate) use executor::write_fake_program;
