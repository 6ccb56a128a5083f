//! svnadmin command execution wrapper.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::error::{RepoError, Result};

/// Wrapper for executing svnadmin commands.
pub struct SvnAdmin {
    program: PathBuf,
}

impl SvnAdmin {
    /// Create a new wrapper, verifying that `program` runs.
    pub fn new(program: impl Into<PathBuf>) -> Result<Self> {
        let program = program.into();
        let output = Command::new(&program)
            .arg("--version")
            .arg("--quiet")
            .output()
            .map_err(|_| RepoError::SvnAdminNotAvailable)?;

        if !output.status.success() {
            return Err(RepoError::SvnAdminNotAvailable);
        }

        log::debug!(
            "Using svnadmin {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(Self { program })
    }

    /// Create an empty repository at `path`.
    pub fn create(&self, path: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("create")
            .arg(path)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RepoError::CommandFailed(stderr.trim().to_string()));
        }

        log::info!("Created repository at {}", path.display());
        Ok(())
    }

    /// Start `svnadmin load` on `path`, returning a writer for the dump stream.
    pub fn load(&self, path: &Path) -> Result<LoadProcess> {
        let mut child = Command::new(&self.program)
            .arg("load")
            .arg("--quiet")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RepoError::CommandFailed("svnadmin load has no stdin".to_string()))?;

        Ok(LoadProcess {
            child,
            stdin: Some(BufWriter::new(stdin)),
        })
    }
}

/// A running `svnadmin load` consuming a dump stream on stdin
pub struct LoadProcess {
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
}

impl LoadProcess {
    /// Close the stream and wait for svnadmin to finish loading.
    pub fn finish(mut self) -> Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.flush()?;
        }
        let status = self.child.wait()?;
        if !status.success() {
            return Err(RepoError::CommandFailed(format!("load exited with {}", status)));
        }
        Ok(())
    }

    fn stream(&mut self) -> std::io::Result<&mut BufWriter<ChildStdin>> {
        self.stdin.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "load stream closed")
        })
    }
}

impl Drop for LoadProcess {
    /// Close the stream and reap svnadmin when `finish` was never called.
    fn drop(&mut self) {
        let Some(stdin) = self.stdin.take() else {
            return;
        };
        // closing stdin ends the dump stream
        drop(stdin);
        match self.child.wait() {
            Ok(status) => log::warn!("Load stream abandoned; svnadmin exited with {}", status),
            Err(e) => log::warn!("Failed to wait for svnadmin: {}", e),
        }
    }
}

impl Write for LoadProcess {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream()?.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream()?.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stands in for svnadmin: `load` copies its input next to the target.
    #[cfg(unix)]
    fn fake_svnadmin(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = r#"#!/bin/sh
case "$1" in
  --version) echo 1.14.0 ;;
  create) mkdir "$2" ;;
  load) cat > "$3.stream"; echo loaded > "$3.done" ;;
  *) exit 1 ;;
esac
"#;
        let path = dir.join("fake-svnadmin");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_dropped_load_is_waited_for() {
        let dir = tempfile::tempdir().unwrap();
        let admin = SvnAdmin::new(fake_svnadmin(dir.path())).unwrap();
        let target = dir.path().join("repo");
        admin.create(&target).unwrap();

        let mut load = admin.load(&target).unwrap();
        load.write_all(b"SVN-fs-dump-format-version: 2\n\n").unwrap();
        drop(load);

        // svnadmin saw the end of the stream and exited before drop returned
        assert!(dir.path().join("repo.done").exists());
        let stream = std::fs::read(dir.path().join("repo.stream")).unwrap();
        assert_eq!(stream, b"SVN-fs-dump-format-version: 2\n\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_finish_waits_for_load() {
        let dir = tempfile::tempdir().unwrap();
        let admin = SvnAdmin::new(fake_svnadmin(dir.path())).unwrap();
        let target = dir.path().join("repo");

        let mut load = admin.load(&target).unwrap();
        load.write_all(b"x").unwrap();
        load.finish().unwrap();
        assert!(dir.path().join("repo.done").exists());
    }

    #[test]
    fn test_missing_program_reported() {
        let result = SvnAdmin::new("/nonexistent/svnadmin-for-tests");
        assert!(matches!(result, Err(RepoError::SvnAdminNotAvailable)));
    }

    #[test]
    fn test_create_and_load_when_available() {
        // Only exercised where Subversion is installed
        let Ok(admin) = SvnAdmin::new("svnadmin") else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let repo_path = dir.path().join("repo");
        admin.create(&repo_path).unwrap();
        assert!(repo_path.join("format").exists());

        let mut load = admin.load(&repo_path).unwrap();
        load.write_all(b"SVN-fs-dump-format-version: 2\n\n").unwrap();
        load.finish().unwrap();
    }
}
