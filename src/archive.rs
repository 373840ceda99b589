//! Moves old test-run folders into per-folder archives.

pub mod age;
mod archiver;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{error, info, warn};

pub use archiver::{Archiver, SevenZip, DEFAULT_SEVEN_ZIP};

use crate::error::Result;
use crate::perf::{self, GatherOptions, RESULTS_JSON_FILE};

pub const DEFAULT_MIN_DAYS: u64 = 100;
pub const DEFAULT_MAX_FOLDERS: usize = 30;
pub const DEFAULT_ARCHIVE_DIR: &str = "../archive";

#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    pub min_days: u64,
    /// 0 means no limit.
    pub max_folders: usize,
    pub gather: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            min_days: DEFAULT_MIN_DAYS,
            max_folders: DEFAULT_MAX_FOLDERS,
            gather: false,
        }
    }
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Application backups are never worth archiving, whatever the run's age.
fn remove_backup_folders(run_dir: &Path) -> Result<()> {
    for test_dir in sorted_subdirs(run_dir)? {
        let backup = test_dir.join("data").join("backup");
        if backup.is_dir() {
            info!("Deleting backup folder: {}", backup.display());
            if let Err(e) = fs::remove_dir_all(&backup) {
                warn!("Could not delete {}: {e}", backup.display());
            }
        }
    }
    Ok(())
}

fn gather_if_missing(run_dir: &Path) {
    if run_dir.join(RESULTS_JSON_FILE).exists() {
        return;
    }

    info!("Gathering perf data for: {}", run_dir.display());
    if let Err(e) = perf::gather(run_dir, &GatherOptions::default()) {
        error!("Gathering failed for {}: {e}", run_dir.display());
    }
}

fn copy_results(run_dir: &Path, dest: &Path, name: &str) {
    let results = run_dir.join(RESULTS_JSON_FILE);
    if !results.exists() {
        info!("Could not find json file: {}", results.display());
        return;
    }

    let target = dest.join(format!("{name}.{RESULTS_JSON_FILE}"));
    if let Err(e) = fs::copy(&results, &target) {
        warn!("Could not copy {}: {e}", results.display());
    }
}

/// Failures only warn: the archive is already written.
fn finish_archive(archive: &Path, run_dir: &Path, modified: SystemTime) {
    let stamped = fs::File::options()
        .write(true)
        .open(archive)
        .and_then(|file| file.set_modified(modified));
    if let Err(e) = stamped {
        warn!("Could not set the date of {}: {e}", archive.display());
    }
    if let Err(e) = fs::remove_dir_all(run_dir) {
        warn!("Could not delete {}: {e}", run_dir.display());
    }
}

/// True when `dest` is `run_dir` or lies somewhere inside it.
fn holds_destination(run_dir: &Path, dest: &Path) -> bool {
    let run_dir = run_dir
        .canonicalize()
        .unwrap_or_else(|_| run_dir.to_path_buf());
    dest.starts_with(run_dir)
}

/// Archives every sufficiently old sub-folder of `source` into `dest`.
/// Returns the names of the folders archived.
pub fn archive_old_runs(
    source: &Path,
    dest: &Path,
    options: &ArchiveOptions,
    archiver: &dyn Archiver,
) -> Result<Vec<String>> {
    age::ensure_safe_path(source)?;

    if !dest.is_dir() {
        error!("Output folder '{}' does not exist", dest.display());
        return Ok(Vec::new());
    }

    info!(
        "Archiving {} into {} (min days old: {} | max folders: {})",
        source.display(),
        dest.display(),
        options.min_days,
        options.max_folders
    );

    let resolved_dest = dest.canonicalize()?;
    let now = SystemTime::now();
    let cutoff = age::cutoff(options.min_days, now);
    let mut archived = Vec::new();

    for run_dir in sorted_subdirs(source)? {
        let name = run_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let archive = dest.join(format!("{name}.7z"));

        if holds_destination(&run_dir, &resolved_dest) {
            warn!("Skipping {name}: it holds the archive folder");
            continue;
        }

        if archive.exists() {
            warn!("Archive {} already exists. Skipping.", archive.display());
            continue;
        }

        remove_backup_folders(&run_dir)?;
        if options.gather {
            gather_if_missing(&run_dir);
        }

        let modified = age::newest_in_subdirs(&run_dir)?;
        if modified > cutoff {
            info!(
                "Skipping {name}: only {} days old (less than {})",
                age::age_in_days(modified, now),
                options.min_days
            );
            continue;
        }

        copy_results(&run_dir, dest, &name);

        info!("Archiving {}: {name}", archived.len() + 1);
        if let Err(e) = archiver.archive(&archive, &run_dir) {
            error!("{e}");
            continue;
        }
        if archive.exists() {
            finish_archive(&archive, &run_dir, modified);
        }
        archived.push(name);

        if options.max_folders > 0 && archived.len() >= options.max_folders {
            break;
        }
    }

    info!("Archived {} folders", archived.len());
    Ok(archived)
}
