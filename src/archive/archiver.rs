use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{Result, WorkbenchError};

pub const DEFAULT_SEVEN_ZIP: &str = "7z";

/// Packs the contents of a directory into a single archive file.
pub trait Archiver {
    fn archive(&self, archive: &Path, source_dir: &Path) -> Result<()>;
}

/// Shells out to 7-Zip, which deletes files as it adds them (`-sdel`).
#[derive(Debug, Clone)]
pub struct SevenZip {
    executable: PathBuf,
}

impl SevenZip {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    fn command(&self, archive: &Path, source_dir: &Path) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .arg("a")
            .arg(archive)
            .arg(source_dir.join("*"))
            .args(["-sdel", "-bso0"]);
        command
    }
}

impl Default for SevenZip {
    fn default() -> Self {
        Self::new(DEFAULT_SEVEN_ZIP)
    }
}

impl Archiver for SevenZip {
    fn archive(&self, archive: &Path, source_dir: &Path) -> Result<()> {
        let mut command = self.command(archive, source_dir);
        debug!("Running {command:?}");

        let status = command
            .stdin(Stdio::null())
            .status()
            .map_err(|e| WorkbenchError::Archive {
                source_dir: source_dir.to_path_buf(),
                reason: format!("could not start {}: {e}", self.executable.display()),
            })?;

        if !status.success() {
            return Err(WorkbenchError::Archive {
                source_dir: source_dir.to_path_buf(),
                reason: format!("{} exited with {status}", self.executable.display()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seven_zip_arguments() {
        let command = SevenZip::default().command(Path::new("/out/run.7z"), Path::new("/runs/run"));
        let args: Vec<_> = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(command.get_program(), "7z");
        assert_eq!(args, ["a", "/out/run.7z", "/runs/run/*", "-sdel", "-bso0"]);
    }

    #[test]
    fn test_missing_executable_is_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SevenZip::new("/nonexistent/7z")
            .archive(&dir.path().join("x.7z"), dir.path())
            .unwrap_err();

        assert!(matches!(err, WorkbenchError::Archive { .. }));
    }
}
