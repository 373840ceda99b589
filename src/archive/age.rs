use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::{Result, WorkbenchError};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Refuses paths that look like an operating system folder.
pub fn ensure_safe_path(path: &Path) -> Result<()> {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if resolved.to_string_lossy().to_lowercase().contains("windows") {
        return Err(WorkbenchError::Config(format!(
            "{} contains 'windows', refusing to delete anything there",
            resolved.display()
        )));
    }
    Ok(())
}

pub fn cutoff(min_days: u64, now: SystemTime) -> SystemTime {
    now.checked_sub(Duration::from_secs(min_days.saturating_mul(SECONDS_PER_DAY)))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Whole days since `modified`; timestamps in the future count as 0.
pub fn age_in_days(modified: SystemTime, now: SystemTime) -> u64 {
    now.duration_since(modified)
        .map(|age| age.as_secs() / SECONDS_PER_DAY)
        .unwrap_or(0)
}

/// Newest file mtime directly inside `dir`, else the mtime of `dir` itself.
pub fn newest_file_in(dir: &Path) -> Result<SystemTime> {
    let newest = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .filter_map(|entry| entry.metadata().ok())
        .filter(fs::Metadata::is_file)
        .filter_map(|meta| meta.modified().ok())
        .max();

    match newest {
        Some(time) => Ok(time),
        None => Ok(fs::metadata(dir)?.modified()?),
    }
}

/// Age of a run folder: the newest file one level into its sub-folders.
/// Falls back to [`newest_file_in`] when there are no sub-folders.
pub fn newest_in_subdirs(dir: &Path) -> Result<SystemTime> {
    let subdirs: Vec<_> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();

    if subdirs.is_empty() {
        return newest_file_in(dir);
    }

    let mut newest = SystemTime::UNIX_EPOCH;
    for subdir in &subdirs {
        newest = newest.max(newest_file_in(subdir)?);
    }
    Ok(newest)
}

#[cfg(test)]
pub(crate) fn set_mtime(path: &Path, time: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

#[cfg(test)]
pub(crate) fn days_ago(days: u64) -> SystemTime {
    SystemTime::now() - Duration::from_secs(days * SECONDS_PER_DAY)
}
