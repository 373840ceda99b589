use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{error, info};

use crate::archive::age::{age_in_days, ensure_safe_path};
use crate::error::Result;

pub const DEFAULT_MIN_DAYS: u64 = 100;

const KEEP_MARKER: &str = "keep";

/// Deletes plain files in `dir` at least `min_days` old, except those with
/// "keep" anywhere in their name. Returns the deleted paths.
pub fn prune_old_files(dir: &Path, min_days: u64) -> Result<Vec<PathBuf>> {
    ensure_safe_path(dir)?;

    if !dir.exists() {
        error!("Folder does not exist: {}", dir.display());
        return Ok(Vec::new());
    }

    info!("Pruning {} (min days old: {min_days})", dir.display());

    let now = SystemTime::now();
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .collect();
    entries.sort_by_key(fs::DirEntry::file_name);

    let mut deleted = Vec::new();
    for entry in entries {
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.contains(KEEP_MARKER) {
            continue;
        }

        let age = age_in_days(metadata.modified()?, now);
        if age < min_days {
            continue;
        }

        info!("Deleting: {}  [Age {age}]", entry.path().display());
        fs::remove_file(entry.path())?;
        deleted.push(entry.path());
    }

    Ok(deleted)
}
