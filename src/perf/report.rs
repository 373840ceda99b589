use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;

use super::collectors::{collect_test, TestSpec, BASELINE_TESTS, EXTRA_TESTS};
use super::host;
use super::model::{BuildInfo, OpLabels, TestResult, TestStatus, TestSuiteRun};
use crate::error::Result;

pub const BASELINE_RESULTS_FILE: &str = "baseline-results.txt";
pub const EXTRA_RESULTS_FILE: &str = "extra-results.txt";
pub const RESULTS_JSON_FILE: &str = "results.json";

const AVERAGED_PREFIXES: [&str; 3] = ["Design", "Check", "Build"];

#[derive(Debug, Default, Clone)]
pub struct GatherOptions {
    pub label: Option<String>,
    pub revision: Option<u64>,
    pub version: Option<String>,
}

#[derive(Debug)]
pub struct GatherOutput {
    pub suite: TestSuiteRun,
    pub files: Vec<PathBuf>,
}

lazy_static::lazy_static! {
    static ref BUILD_NAME: Regex =
        Regex::new(r"r([0-9]+).*?v([0-9.]+)").expect("build regex is valid");
}

/// Revision and version encoded in a run folder or report file name,
/// e.g. `r51234_v4.2.1`.
pub fn build_info_from_name(name: &str) -> Option<BuildInfo> {
    let captures = BUILD_NAME.captures(name)?;
    let revision = captures.get(1)?.as_str().parse().ok()?;
    let version = captures.get(2)?.as_str().trim_end_matches('.').to_string();

    Some(BuildInfo {
        revision,
        version_short: version.clone(),
        version_long: version,
    })
}

fn resolve_build_info(base_path: &Path, options: &GatherOptions) -> BuildInfo {
    let folder_name = base_path
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();

    let mut build = build_info_from_name(&folder_name).unwrap_or_default();
    if let Some(revision) = options.revision {
        build.revision = revision;
    }
    if let Some(version) = &options.version {
        build.version_short.clone_from(version);
        build.version_long.clone_from(version);
    }
    build
}

/// Mean of `<prefix><n>` operations with `n != 1`; the first run is a warm-up.
pub fn average_excluding_first(result: &TestResult, prefix: &str) -> Option<f64> {
    let values: Vec<f64> = result
        .operations
        .values()
        .filter(|op| {
            op.label
                .strip_prefix(prefix)
                .and_then(|n| n.parse::<u32>().ok())
                .is_some_and(|n| n != 1)
        })
        .map(|op| op.value)
        .collect();

    if values.is_empty() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    Some(avg)
}

fn compute_averages(result: &TestResult) -> IndexMap<String, f64> {
    AVERAGED_PREFIXES
        .iter()
        .filter_map(|prefix| {
            average_excluding_first(result, prefix).map(|avg| (format!("{prefix}Average"), avg))
        })
        .collect()
}

fn collect_catalog(base_path: &Path, catalog: &[TestSpec]) -> Vec<TestResult> {
    catalog
        .iter()
        .filter_map(|spec| collect_test(spec, base_path))
        .map(|mut result| {
            for op in result.operations.values() {
                debug!(
                    "{} {} = {} ({})",
                    result.test_label,
                    op.label,
                    op.value,
                    op.source_line.as_deref().unwrap_or_default()
                );
            }
            result.averages = compute_averages(&result);
            result
        })
        .collect()
}

/// Suite start is the earliest child start, its end the latest child end.
pub fn assemble_suite(
    label: String,
    build_tested: BuildInfo,
    test_results: Vec<TestResult>,
) -> TestSuiteRun {
    let start = test_results.iter().filter_map(|r| r.start_date_time).min();
    let end = test_results.iter().filter_map(TestResult::end_date_time).max();

    let duration_ms = match (start, end) {
        (Some(start), Some(end)) => u64::try_from((end - start).num_milliseconds()).unwrap_or(0),
        _ => 0,
    };

    TestSuiteRun {
        label,
        machine: host::detect(),
        build_tested,
        start_date_time: start,
        duration_ms,
        test_results,
    }
}

/// Positional dump: one value per line, blank line between tests.
pub fn render_text(results: &[TestResult]) -> String {
    let mut out = String::new();

    for result in results {
        if result.status == TestStatus::Failed {
            continue;
        }

        let leading = OpLabels::LEADING
            .iter()
            .filter_map(|label| result.operation(label));
        let runs = result
            .operations
            .values()
            .filter(|op| !OpLabels::is_well_known(&op.label));
        let trailing = OpLabels::TRAILING
            .iter()
            .filter_map(|label| result.operation(label));

        for op in leading.chain(runs).chain(trailing) {
            let _ = writeln!(out, "{:.3}", op.display_value());
        }
        out.push('\n');
    }

    out
}

/// JSON with the 3-space indent the historical reports use.
pub fn to_json_string<T: Serialize>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"   ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn gather(base_path: &Path, options: &GatherOptions) -> Result<GatherOutput> {
    info!("Gathering performance data in {}", base_path.display());

    let baseline = collect_catalog(base_path, &BASELINE_TESTS);
    let extra = collect_catalog(base_path, &EXTRA_TESTS);

    for failed in baseline
        .iter()
        .chain(extra.iter())
        .filter(|r| r.status == TestStatus::Failed)
    {
        warn!(
            "{} left out of the text report: {}",
            failed.test_label,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }

    let baseline_path = base_path.join(BASELINE_RESULTS_FILE);
    fs::write(&baseline_path, render_text(&baseline))?;

    let extra_path = base_path.join(EXTRA_RESULTS_FILE);
    fs::write(&extra_path, render_text(&extra))?;

    let label = options.label.clone().unwrap_or_else(|| {
        base_path
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "test-suite".to_string())
    });
    let build = resolve_build_info(base_path, options);

    let mut all_results = baseline;
    all_results.extend(extra);
    let suite = assemble_suite(label, build, all_results);

    let json_path = base_path.join(RESULTS_JSON_FILE);
    fs::write(&json_path, to_json_string(&suite)?)?;

    info!(
        "Collected {} tests into {}",
        suite.test_results.len(),
        json_path.display()
    );

    Ok(GatherOutput {
        suite,
        files: vec![baseline_path, extra_path, json_path],
    })
}
