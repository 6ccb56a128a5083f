//! SCCS command execution wrapper.

use super::parser::PRS_FORMAT;
use super::SccsError;
use crate::record::ChangeRecord;
use std::path::Path;
use std::process::Command;

/// Whether `get` expands SCCS keywords such as `%W%` and `%G%`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordMode {
    /// Contents as a checkout would see them
    Expanded,
    /// Keywords left as written (`get -k`)
    Unexpanded,
}

/// Where per-file SCCS history comes from.
pub trait HistorySource {
    /// Raw `prs` output describing every delta of an s-file.
    fn log(&self, sfile: &Path) -> Result<String, SccsError>;

    /// Contents of the file at the record's version.
    fn contents(&self, record: &ChangeRecord, mode: KeywordMode) -> Result<Vec<u8>, SccsError>;
}

/// Wrapper for executing sccs commands.
pub struct SccsExecutor {
    program: String,
}

impl SccsExecutor {
    /// Create a new executor, checking that `program` can be started.
    pub fn new(program: &str) -> Result<Self, SccsError> {
        // `sccs` has no version flag; running `help` with no topic is enough
        // to prove the program exists.
        Command::new(program)
            .arg("help")
            .output()
            .map_err(|e| SccsError::SccsNotAvailable(format!("{}: {}", program, e)))?;

        Ok(Self {
            program: program.to_string(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl HistorySource for SccsExecutor {
    fn log(&self, sfile: &Path) -> Result<String, SccsError> {
        let output = Command::new(&self.program)
            .arg("prs")
            .arg("-e")
            .arg(format!("-d{}", PRS_FORMAT))
            .arg(sfile)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SccsError::CommandFailed {
                path: sfile.to_path_buf(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(decode_log(output.stdout))
    }

    fn contents(&self, record: &ChangeRecord, mode: KeywordMode) -> Result<Vec<u8>, SccsError> {
        let name = record.file_name().ok_or_else(|| SccsError::ContentFetch {
            path: record.path().to_path_buf(),
            version: record.version().to_string(),
            reason: "not an s-file".to_string(),
        })?;

        let mut cmd = Command::new(&self.program);
        cmd.arg("-p").arg(record.sccs_dir()).arg("get").arg("-s").arg("-p");
        if mode == KeywordMode::Unexpanded {
            cmd.arg("-k");
        }
        cmd.arg(format!("-r{}", record.version())).arg(name);

        let output = cmd.output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SccsError::ContentFetch {
                path: record.path().to_path_buf(),
                version: record.version().to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

/// Decode `prs` output. Comments and user names predating UTF-8 are
/// read as Latin-1 so every byte survives.
fn decode_log(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!("prs output is not UTF-8, decoding as Latin-1");
            e.into_bytes().into_iter().map(char::from).collect()
        }
    }
}

/// Write an executable shell script standing in for the SCCS front-end.
#[cfg(all(test, unix))]
pub(crate) fn write_fake_program(dir: &Path, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-sccs");
    std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
