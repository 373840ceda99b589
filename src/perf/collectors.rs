use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use super::extract::{all_lines, matching_lines, perf_log_path, test_log_path};
use super::fields;
use super::model::{OpLabels, OpResult, TestResult, TestStatus};
use crate::error::{Result, WorkbenchError};

const STOPWATCH_MARKER: &str = "TC.Stopwatch";
const BENCHMARK_MARKER: &str = "BenchmarkResults";
const FILE_SIZE_MARKER: &str = "Pamir job:";
const ACTION_COMPLETE_MARKER: &str = "Action.Execute\tComplete";

const PAINT_TOTAL_INDEX: usize = 4;
const REFRESH_AVERAGE_INDEX: usize = 6;

const DESIGN_CHECK_LABELS: [&str; 10] = [
    "Design1", "Check1", "Design2", "Check2", "Design3", "Check3", "Design4", "Check4", "Design5",
    "Check5",
];
const BUILD_LABELS: [&str; 10] = [
    "Build1", "Build2", "Build3", "Build4", "Build5", "Build6", "Build7", "Build8", "Build9",
    "Build10",
];

/// Which stopwatch lines a test writes at startup and shutdown, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    Standard,
    WithMetalwork,
    TwentyTwenty,
    Sapphire,
}

impl Startup {
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Startup::Standard => &[
                OpLabels::TO_LOGIN,
                OpLabels::TO_MAIN_FORM,
                OpLabels::PAMIR_SHUTDOWN,
            ],
            Startup::WithMetalwork => &[
                OpLabels::TO_LOGIN,
                OpLabels::TO_MAIN_FORM,
                OpLabels::SELECT_METALWORK,
                OpLabels::PAMIR_SHUTDOWN,
            ],
            Startup::TwentyTwenty => &[
                OpLabels::TO_LOGIN,
                OpLabels::TO_MAIN_FORM,
                OpLabels::PAMIR_SHUTDOWN,
                OpLabels::TWENTY20_SHUTDOWN,
            ],
            Startup::Sapphire => &[
                OpLabels::TO_LOGIN,
                OpLabels::TO_MAIN_FORM,
                OpLabels::SAPPHIRE_REPORT,
                OpLabels::SAPPHIRE_SHUTDOWN,
                OpLabels::PAMIR_SHUTDOWN,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Labels {
    Fixed(&'static [&'static str]),
    Numbered(&'static str),
}

impl Labels {
    fn get(self, index: usize) -> Option<String> {
        match self {
            Labels::Fixed(labels) => labels.get(index).map(|l| (*l).to_string()),
            Labels::Numbered(prefix) => Some(format!("{prefix}{}", index + 1)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Every perf log line containing `needle`, read as a total time.
    PerfTotals { needle: &'static str, labels: Labels },
    /// Every perf log line containing `needle`, read from the duration column.
    PerfColumns { needle: &'static str, prefix: &'static str },
    /// The first line containing `needle` among perf log lines containing `marker`.
    PerfSearch {
        marker: &'static str,
        needle: &'static str,
        label: &'static str,
    },
    /// A benchmark result line from the test log, addressed by position.
    Benchmark { index: usize, label: &'static str },
    FileSize,
}

const PAINT: Step = Step::Benchmark {
    index: PAINT_TOTAL_INDEX,
    label: "LayoutPaint",
};
const REFRESH: Step = Step::Benchmark {
    index: REFRESH_AVERAGE_INDEX,
    label: "Refresh",
};
const BUILD_FRAME_TOTALS: Step = Step::PerfTotals {
    needle: "BuildFrame",
    labels: Labels::Numbered("BuildFrame"),
};
const BUILD_DESIGN_TOTALS: Step = Step::PerfTotals {
    needle: "BuildDesign",
    labels: Labels::Numbered("BuildDesign"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKind {
    DesignCheck,
    BuildBatch,
    NavigationTrim,
    MonoToDuo,
    FrameDesign,
    HipToHip,
    Benchmark,
    OutputPdf,
    HangerHipToHip { enabled: bool },
    ThousandDrawingObjects,
    FileSize,
    OpenAndSave,
    Synchronisation,
    SapphireReport,
    DesignTotals,
}

impl TestKind {
    fn startup(self) -> Startup {
        match self {
            TestKind::HangerHipToHip { enabled: true } => Startup::WithMetalwork,
            TestKind::Synchronisation => Startup::TwentyTwenty,
            TestKind::SapphireReport => Startup::Sapphire,
            _ => Startup::Standard,
        }
    }

    fn steps(self) -> Vec<Step> {
        match self {
            TestKind::DesignCheck => vec![Step::PerfTotals {
                needle: "UI.BuildDesign",
                labels: Labels::Fixed(&DESIGN_CHECK_LABELS),
            }],
            TestKind::BuildBatch => vec![Step::PerfTotals {
                needle: "UI.Build",
                labels: Labels::Fixed(&BUILD_LABELS),
            }],
            TestKind::NavigationTrim => vec![
                PAINT,
                REFRESH,
                Step::PerfSearch {
                    marker: ACTION_COMPLETE_MARKER,
                    needle: "Toggle automatic framing zone",
                    label: "ChangeAutoLevel",
                },
                Step::PerfSearch {
                    marker: ACTION_COMPLETE_MARKER,
                    needle: "Trim/Extend",
                    label: "TrimExtend",
                },
            ],
            TestKind::MonoToDuo => vec![
                PAINT,
                REFRESH,
                Step::PerfSearch {
                    marker: ACTION_COMPLETE_MARKER,
                    needle: "Delete",
                    label: "Delete",
                },
            ],
            TestKind::FrameDesign => vec![Step::Benchmark {
                index: 11,
                label: "DesignAverage",
            }],
            TestKind::HipToHip => vec![
                BUILD_FRAME_TOTALS,
                BUILD_DESIGN_TOTALS,
                PAINT,
                REFRESH,
                Step::FileSize,
            ],
            TestKind::Benchmark => vec![PAINT, REFRESH],
            TestKind::OutputPdf => vec![
                Step::PerfColumns {
                    needle: "OutputPrintManagerOpearation",
                    prefix: "Page",
                },
                Step::FileSize,
            ],
            TestKind::HangerHipToHip { enabled } => {
                let mut steps = vec![BUILD_FRAME_TOTALS, BUILD_DESIGN_TOTALS];
                if enabled {
                    steps.push(Step::FileSize);
                }
                steps
            }
            TestKind::ThousandDrawingObjects => vec![
                Step::Benchmark {
                    index: 4,
                    label: "LayoutPaint1",
                },
                Step::Benchmark {
                    index: 6,
                    label: "Refresh1",
                },
                Step::Benchmark {
                    index: 14,
                    label: "LayoutPaint2",
                },
                Step::Benchmark {
                    index: 16,
                    label: "Refresh2",
                },
            ],
            TestKind::FileSize => vec![BUILD_DESIGN_TOTALS, Step::FileSize],
            TestKind::OpenAndSave => vec![
                Step::PerfSearch {
                    marker: "OpenProject\tComplete",
                    needle: "Complete",
                    label: "OpenProject",
                },
                Step::PerfSearch {
                    marker: "UI.SaveProjectOperation\tComplete",
                    needle: "Save",
                    label: "SaveProject",
                },
            ],
            TestKind::Synchronisation => vec![
                Step::PerfSearch {
                    marker: "Saving\tComplete",
                    needle: "Complete",
                    label: "SaveProject",
                },
                Step::PerfSearch {
                    marker: "UI.MBASynchroniseOperation\tComplete",
                    needle: "Complete",
                    label: "Synchronise",
                },
            ],
            TestKind::SapphireReport => vec![],
            TestKind::DesignTotals => vec![BUILD_DESIGN_TOTALS],
        }
    }
}

pub trait Collector {
    fn label(&self) -> &str;

    fn collect(&self, test_dir: &Path) -> Result<TestResult>;
}

#[derive(Debug, Clone, Copy)]
pub struct TestSpec {
    pub label: &'static str,
    pub kind: TestKind,
}

impl TestSpec {
    pub const fn new(label: &'static str, kind: TestKind) -> Self {
        Self { label, kind }
    }
}

pub const BASELINE_TESTS: [TestSpec; 3] = [
    TestSpec::new("DPT1", TestKind::DesignCheck),
    TestSpec::new("DPT2", TestKind::DesignCheck),
    TestSpec::new("BBT3", TestKind::BuildBatch),
];

pub const EXTRA_TESTS: [TestSpec; 22] = [
    TestSpec::new("NTT4", TestKind::NavigationTrim),
    TestSpec::new("MDT5", TestKind::MonoToDuo),
    TestSpec::new("HD4_FDT6", TestKind::FrameDesign),
    TestSpec::new("CHP_FDT10", TestKind::FrameDesign),
    TestSpec::new("FR-HHT7", TestKind::HipToHip),
    TestSpec::new("UK-HHT8", TestKind::HipToHip),
    TestSpec::new("FR_LWS9", TestKind::Benchmark),
    TestSpec::new("UK_TDOT17", TestKind::ThousandDrawingObjects),
    TestSpec::new("SW_FBMT11", TestKind::Benchmark),
    TestSpec::new("UK_HT1_FBMT12", TestKind::Benchmark),
    TestSpec::new("ISOLA_PDF13", TestKind::OutputPdf),
    TestSpec::new("UK_LayoutPDF14", TestKind::OutputPdf),
    TestSpec::new("UK-DISH15", TestKind::HangerHipToHip { enabled: false }),
    TestSpec::new("UK-ENAH16", TestKind::HangerHipToHip { enabled: true }),
    TestSpec::new("FR-MST18", TestKind::FileSize),
    TestSpec::new("FR-SST19", TestKind::FileSize),
    TestSpec::new("FR-DST20", TestKind::FileSize),
    TestSpec::new("UK-OST21", TestKind::OpenAndSave),
    TestSpec::new("T22-FR-MDC", TestKind::DesignTotals),
    TestSpec::new("T23-FR-SCAB", TestKind::DesignTotals),
    TestSpec::new("UK-SYNC", TestKind::Synchronisation),
    TestSpec::new("UK-SAREP", TestKind::SapphireReport),
];

impl Collector for TestSpec {
    fn label(&self) -> &str {
        self.label
    }

    fn collect(&self, test_dir: &Path) -> Result<TestResult> {
        let mut result = TestResult::new(self.label);
        collect_startup(&mut result, test_dir, self.kind.startup())?;

        for step in self.kind.steps() {
            run_step(&mut result, test_dir, step)?;
        }

        Ok(result)
    }
}

/// Collects one test from `base_path/<label>`.
///
/// Returns `None` when the test directory does not exist. Collection errors
/// are recorded on the result as a failed status.
pub fn collect_test(collector: &dyn Collector, base_path: &Path) -> Option<TestResult> {
    let test_dir = base_path.join(collector.label());
    if !test_dir.is_dir() {
        debug!("No directory for test {}", collector.label());
        return None;
    }

    let mut result = collector.collect(&test_dir).unwrap_or_else(|e| {
        warn!("Test {} could not be collected: {e}", collector.label());
        let mut failed = TestResult::new(collector.label());
        failed.status = TestStatus::Failed;
        failed.error = Some(e.to_string());
        failed
    });

    stamp_timing(&mut result, &test_log_path(&test_dir));
    Some(result)
}

/// Startup lines are positional; any trailing ones may be absent.
pub fn collect_startup(result: &mut TestResult, test_dir: &Path, startup: Startup) -> Result<()> {
    let path = test_log_path(test_dir);
    let lines = matching_lines(&path, STOPWATCH_MARKER);
    let labels = startup.labels();

    if lines.len() < 2 {
        warn!(
            "{}: expected at least 2 stopwatch lines in {}, found {}",
            result.test_label,
            path.display(),
            lines.len()
        );
        return Ok(());
    }

    if lines.len() > labels.len() {
        warn!(
            "{}: ignoring {} extra stopwatch lines",
            result.test_label,
            lines.len() - labels.len()
        );
    }

    for (line, label) in lines.iter().zip(labels) {
        let millis = fields::stopwatch_millis(line)?;
        result.add_result(OpResult::duration_ms(*label, millis, line));
    }

    Ok(())
}

fn nth_line(lines: &[String], index: usize, path: &Path, needle: &str) -> Result<String> {
    lines
        .get(index)
        .cloned()
        .ok_or_else(|| WorkbenchError::MissingLine {
            path: path.to_path_buf(),
            needle: needle.to_string(),
            index,
        })
}

fn run_step(result: &mut TestResult, test_dir: &Path, step: Step) -> Result<()> {
    match step {
        Step::PerfTotals { needle, labels } => {
            let lines = matching_lines(&perf_log_path(test_dir), needle);
            for (i, line) in lines.iter().enumerate() {
                let Some(label) = labels.get(i) else {
                    warn!("{}: no label for run {}, ignoring", result.test_label, i + 1);
                    continue;
                };
                let seconds = fields::total_seconds(line)?;
                result.add_result(OpResult::duration_ms(label, seconds * 1000.0, line));
            }
        }
        Step::PerfColumns { needle, prefix } => {
            let lines = matching_lines(&perf_log_path(test_dir), needle);
            for (i, line) in lines.iter().enumerate() {
                let millis = fields::perf_column_millis(line)?;
                result.add_result(OpResult::duration_ms(
                    format!("{prefix}{}", i + 1),
                    millis,
                    line,
                ));
            }
        }
        Step::PerfSearch {
            marker,
            needle,
            label,
        } => {
            let path = perf_log_path(test_dir);
            let lines = matching_lines(&path, marker);
            let (line, millis) = fields::search_perf_column_millis(&lines, needle).ok_or_else(
                || WorkbenchError::MissingLine {
                    path: path.clone(),
                    needle: format!("{marker} / {needle}"),
                    index: 0,
                },
            )?;
            result.add_result(OpResult::duration_ms(label, millis?, line));
        }
        Step::Benchmark { index, label } => {
            let path = test_log_path(test_dir);
            let lines = matching_lines(&path, BENCHMARK_MARKER);
            let line = nth_line(&lines, index, &path, BENCHMARK_MARKER)?;
            let millis = fields::stopwatch_millis(&line)?;
            result.add_result(OpResult::duration_ms(label, millis, &line));
        }
        Step::FileSize => {
            let path = test_log_path(test_dir);
            let lines = matching_lines(&path, FILE_SIZE_MARKER);
            let line = nth_line(&lines, 0, &path, FILE_SIZE_MARKER)?;
            let kilobytes = fields::file_size_kilobytes(&line)?;
            result.add_result(OpResult::file_size_kb(OpLabels::FILE_SIZE, kilobytes, &line));
        }
    }

    Ok(())
}

/// Start and duration from the first and last timestamped lines of the test
/// log, or the log's modification time when nothing is timestamped.
pub fn stamp_timing(result: &mut TestResult, test_log: &Path) {
    let stamps: Vec<DateTime<Utc>> = all_lines(test_log)
        .iter()
        .filter_map(|line| fields::line_timestamp(line))
        .collect();

    if let (Some(first), Some(last)) = (stamps.first(), stamps.last()) {
        result.start_date_time = Some(*first);
        result.duration_ms = u64::try_from((*last - *first).num_milliseconds()).unwrap_or(0);
        return;
    }

    match std::fs::metadata(test_log).and_then(|m| m.modified()) {
        Ok(modified) => {
            result.start_date_time = Some(DateTime::<Utc>::from(modified));
            result.duration_ms = 0;
        }
        Err(e) => debug!("No timing for {}: {e}", result.test_label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write_test_dir(base: &Path, label: &str, test_log: &str, perf_log: Option<&str>) -> PathBuf {
        let dir = base.join(label);
        fs::create_dir_all(dir.join("data")).unwrap();
        fs::write(dir.join("testrun.log"), test_log).unwrap();
        if let Some(perf) = perf_log {
            fs::write(dir.join("data/pamir-perf.log"), perf).unwrap();
        }
        dir
    }

    fn benchmark_lines(count: usize) -> String {
        (0..count)
            .map(|i| format!("BenchmarkResults metric{i},{}\n", (i + 1) * 100))
            .collect()
    }

    #[test]
    fn test_two_stopwatch_lines_leave_shutdown_absent() {
        let base = tempfile::tempdir().unwrap();
        let dir = write_test_dir(
            base.path(),
            "DPT1",
            "TC.Stopwatch Login,1000\nTC.Stopwatch MainForm,2500\n",
            None,
        );
        let mut result = TestResult::new("DPT1");

        collect_startup(&mut result, &dir, Startup::Standard).unwrap();

        assert!((result.operation(OpLabels::TO_LOGIN).unwrap().value - 1000.0).abs() < 1e-9);
        assert!((result.operation(OpLabels::TO_MAIN_FORM).unwrap().value - 2500.0).abs() < 1e-9);
        assert!(result.operation(OpLabels::PAMIR_SHUTDOWN).is_none());
    }

    #[test]
    fn test_three_stopwatch_lines_add_shutdown() {
        let base = tempfile::tempdir().unwrap();
        let dir = write_test_dir(
            base.path(),
            "DPT1",
            "TC.Stopwatch Login,1000\nTC.Stopwatch MainForm,2500\nTC.Stopwatch Exit,700\n",
            None,
        );
        let mut result = TestResult::new("DPT1");

        collect_startup(&mut result, &dir, Startup::Standard).unwrap();

        assert!((result.operation(OpLabels::PAMIR_SHUTDOWN).unwrap().value - 700.0).abs() < 1e-9);
        assert_eq!(result.operations.len(), 3);
    }

    #[test]
    fn test_sapphire_startup_order() {
        let base = tempfile::tempdir().unwrap();
        let dir = write_test_dir(
            base.path(),
            "UK-SAREP",
            "TC.Stopwatch a,1\nTC.Stopwatch b,2\nTC.Stopwatch c,3\nTC.Stopwatch d,4\n",
            None,
        );
        let mut result = TestResult::new("UK-SAREP");

        collect_startup(&mut result, &dir, Startup::Sapphire).unwrap();

        let labels: Vec<_> = result.operations.keys().cloned().collect();
        assert_eq!(
            labels,
            vec!["ToLogin", "ToMainForm", "SapphireReport", "SapphireShutdown"]
        );
    }

    #[test]
    fn test_design_check_collects_labelled_totals() {
        let base = tempfile::tempdir().unwrap();
        let perf = "UI.BuildDesign a: 1.5s (x)\nUI.BuildDesign b: 2.0s (y)\nother\n";
        let dir = write_test_dir(
            base.path(),
            "DPT1",
            "TC.Stopwatch a,1\nTC.Stopwatch b,2\n",
            Some(perf),
        );

        let result = BASELINE_TESTS[0].collect(&dir).unwrap();

        assert!((result.operation("Design1").unwrap().value - 1500.0).abs() < 1e-9);
        assert!((result.operation("Check1").unwrap().value - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_navigation_trim_collects_benchmarks_and_searches() {
        let base = tempfile::tempdir().unwrap();
        let test_log = format!("TC.Stopwatch a,1\nTC.Stopwatch b,2\n{}", benchmark_lines(7));
        let perf = "t\tAction.Execute\tComplete\tToggle automatic framing zone\t300\n\
                    t\tAction.Execute\tComplete\tTrim/Extend\t450\n";
        let dir = write_test_dir(base.path(), "NTT4", &test_log, Some(perf));
        let spec = TestSpec::new("NTT4", TestKind::NavigationTrim);

        let result = spec.collect(&dir).unwrap();

        assert!((result.operation("LayoutPaint").unwrap().value - 500.0).abs() < 1e-9);
        assert!((result.operation("Refresh").unwrap().value - 700.0).abs() < 1e-9);
        assert!((result.operation("ChangeAutoLevel").unwrap().value - 300.0).abs() < 1e-9);
        assert!((result.operation("TrimExtend").unwrap().value - 450.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_benchmark_line_is_an_error() {
        let base = tempfile::tempdir().unwrap();
        let test_log = format!("TC.Stopwatch a,1\nTC.Stopwatch b,2\n{}", benchmark_lines(3));
        let dir = write_test_dir(base.path(), "FR_LWS9", &test_log, None);
        let spec = TestSpec::new("FR_LWS9", TestKind::Benchmark);

        let err = spec.collect(&dir).unwrap_err();

        assert!(matches!(err, WorkbenchError::MissingLine { index: 4, .. }));
    }

    #[test]
    fn test_file_size_recorded_in_kilobytes() {
        let base = tempfile::tempdir().unwrap();
        let test_log = "TC.Stopwatch a,1\nTC.Stopwatch b,2\nSaved Pamir job: c:\\x.pmr, 3072\n";
        let perf = "BuildDesign total: 4.0 (1)\n";
        let dir = write_test_dir(base.path(), "FR-MST18", test_log, Some(perf));
        let spec = TestSpec::new("FR-MST18", TestKind::FileSize);

        let result = spec.collect(&dir).unwrap();

        let size = result.operation(OpLabels::FILE_SIZE).unwrap();
        assert!((size.to_megabytes() - 3.0).abs() < 1e-9);
        assert!((result.operation("BuildDesign1").unwrap().value - 4000.0).abs() < 1e-9);
    }

    #[test]
    fn test_collect_test_missing_dir_is_none() {
        let base = tempfile::tempdir().unwrap();
        assert!(collect_test(&BASELINE_TESTS[0], base.path()).is_none());
    }

    #[test]
    fn test_collect_test_records_failure() {
        let base = tempfile::tempdir().unwrap();
        write_test_dir(base.path(), "HD4_FDT6", "TC.Stopwatch a,1\n", None);
        let spec = TestSpec::new("HD4_FDT6", TestKind::FrameDesign);

        let result = collect_test(&spec, base.path()).unwrap();

        assert_eq!(result.status, TestStatus::Failed);
        assert!(result.error.unwrap().contains("BenchmarkResults"));
        assert!(result.start_date_time.is_some());
    }

    #[test]
    fn test_stamp_timing_uses_first_and_last_timestamps() {
        let base = tempfile::tempdir().unwrap();
        let dir = write_test_dir(
            base.path(),
            "DPT1",
            "2024-01-01 10:00:00 start\nnothing\n2024-01-01 10:00:30.500 end\n",
            None,
        );
        let mut result = TestResult::new("DPT1");

        stamp_timing(&mut result, &dir.join("testrun.log"));

        assert_eq!(result.duration_ms, 30_500);
        assert!(result.start_date_time.is_some());
    }
}
