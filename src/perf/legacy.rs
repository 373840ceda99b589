use std::fs;
use std::path::Path;

use log::{info, warn};
use serde_json::Value;

use super::report::{build_info_from_name, to_json_string};
use crate::error::Result;

pub const DEFAULT_SOURCE_DIR: &str = "./jcv_test/legacy";
pub const DEFAULT_TARGET_DIR: &str = "./jcv_test/converted";

const BUILD_TESTED: &str = "buildTested";
const REVISION: &str = "revision";
const VERSION_SHORT: &str = "versionShort";
const VERSION_LONG: &str = "versionLong";

/// Fills in the build revision and version from `file_name` when the report
/// lacks them. Returns false when the report needed fixing but could not be.
pub fn fix_build_number(report: &mut Value, file_name: &str) -> bool {
    let Some(root) = report.as_object_mut() else {
        return false;
    };
    let build = root
        .entry(BUILD_TESTED)
        .or_insert_with(|| Value::Object(serde_json::Map::new()));
    let Some(build) = build.as_object_mut() else {
        return false;
    };

    let revision = build.get(REVISION).and_then(Value::as_u64).unwrap_or(0);
    let version = build
        .get(VERSION_SHORT)
        .and_then(Value::as_str)
        .unwrap_or_default();
    if revision > 0 && !version.is_empty() {
        return true;
    }

    let Some(info) = build_info_from_name(file_name) else {
        return false;
    };

    build.insert(REVISION.to_string(), Value::from(info.revision));
    build.insert(VERSION_SHORT.to_string(), Value::from(info.version_short));
    build.insert(VERSION_LONG.to_string(), Value::from(info.version_long));
    true
}

/// Rewrites every `*.json` report in `source` into `target` and returns how
/// many were written. Invalid JSON is skipped.
pub fn convert_directory(source: &Path, target: &Path) -> Result<usize> {
    info!(
        "Converting files in {}. Output to {}",
        source.display(),
        target.display()
    );

    fs::create_dir_all(target)?;

    let mut names: Vec<String> = fs::read_dir(source)?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".json"))
        .collect();
    names.sort();

    let mut written = 0;
    for name in &names {
        let content = fs::read(source.join(name))?;
        let mut report: Value = match serde_json::from_slice(&content) {
            Ok(report) => report,
            Err(e) => {
                warn!("Skipping {name}: {e}");
                continue;
            }
        };

        if fix_build_number(&mut report, name) {
            fs::write(target.join(name), to_json_string(&report)?)?;
        } else {
            warn!("Could not fix build information for {name}, copying it unchanged");
            fs::write(target.join(name), &content)?;
        }
        written += 1;
    }

    info!("Converted {written} of {} reports", names.len());
    Ok(written)
}
