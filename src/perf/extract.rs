use std::path::{Path, PathBuf};

use log::debug;

pub const TEST_LOG: &str = "testrun.log";
const PERF_LOG_CANDIDATES: [&str; 2] = ["data/pamir-perf.log", "data/Pamir-perf.log"];

pub fn test_log_path(test_dir: &Path) -> PathBuf {
    test_dir.join(TEST_LOG)
}

/// The perf log has been written with both capitalisations over the years.
pub fn perf_log_path(test_dir: &Path) -> PathBuf {
    PERF_LOG_CANDIDATES
        .iter()
        .map(|candidate| test_dir.join(candidate))
        .find(|path| path.exists())
        .unwrap_or_else(|| test_dir.join(PERF_LOG_CANDIDATES[0]))
}

/// Returns the trimmed lines of `path` containing `needle`, in file order.
///
/// A missing or unreadable file yields no lines rather than an error, and
/// invalid UTF-8 is decoded lossily.
pub fn matching_lines(path: &Path, needle: &str) -> Vec<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Skipping {}: {e}", path.display());
            return vec![];
        }
    };

    String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::trim)
        .filter(|line| line.contains(needle))
        .map(str::to_string)
        .collect()
}

/// All trimmed, non-empty lines of `path`, with the same tolerance as
/// [`matching_lines`].
pub fn all_lines(path: &Path) -> Vec<String> {
    matching_lines(path, "")
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect()
}
