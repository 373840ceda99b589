use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Well-known operation labels shared by several collectors.
pub struct OpLabels;

impl OpLabels {
    pub const TO_LOGIN: &'static str = "ToLogin";
    pub const TO_MAIN_FORM: &'static str = "ToMainForm";
    pub const PAMIR_SHUTDOWN: &'static str = "PamirShutdown";
    pub const SELECT_METALWORK: &'static str = "SelectMetalwork";
    pub const SAPPHIRE_REPORT: &'static str = "SapphireReport";
    pub const SAPPHIRE_SHUTDOWN: &'static str = "SapphireShutdown";
    pub const TWENTY20_SHUTDOWN: &'static str = "2020Shutdown";
    pub const FILE_SIZE: &'static str = "FileSize";

    /// Printed before the run operations in the text dump.
    pub const LEADING: [&'static str; 3] =
        [Self::TO_LOGIN, Self::TO_MAIN_FORM, Self::SELECT_METALWORK];

    /// Printed after the run operations in the text dump.
    pub const TRAILING: [&'static str; 5] = [
        Self::SAPPHIRE_REPORT,
        Self::PAMIR_SHUTDOWN,
        Self::SAPPHIRE_SHUTDOWN,
        Self::TWENTY20_SHUTDOWN,
        Self::FILE_SIZE,
    ];

    pub fn is_well_known(label: &str) -> bool {
        Self::LEADING.contains(&label) || Self::TRAILING.contains(&label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    DurationMs,
    FileSizeKb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpResult {
    pub label: String,
    pub value: f64,
    pub kind: ValueKind,
    #[serde(skip)]
    pub source_line: Option<String>,
}

impl OpResult {
    pub fn duration_ms(label: impl Into<String>, value: f64, source_line: &str) -> Self {
        Self {
            label: label.into(),
            value,
            kind: ValueKind::DurationMs,
            source_line: Some(source_line.to_string()),
        }
    }

    pub fn file_size_kb(label: impl Into<String>, value: f64, source_line: &str) -> Self {
        Self {
            label: label.into(),
            value,
            kind: ValueKind::FileSizeKb,
            source_line: Some(source_line.to_string()),
        }
    }

    pub fn to_seconds(&self) -> f64 {
        self.value / 1000.0
    }

    pub fn to_megabytes(&self) -> f64 {
        self.value / 1024.0
    }

    /// Value in the unit used by the text dump.
    pub fn display_value(&self) -> f64 {
        match self.kind {
            ValueKind::DurationMs => self.to_seconds(),
            ValueKind::FileSizeKb => self.to_megabytes(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test_label: String,
    pub start_date_time: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub operations: IndexMap<String, OpResult>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub averages: IndexMap<String, f64>,
}

impl TestResult {
    pub fn new(test_label: &str) -> Self {
        Self {
            test_label: test_label.to_string(),
            start_date_time: None,
            duration_ms: 0,
            status: TestStatus::Passed,
            error: None,
            operations: IndexMap::new(),
            averages: IndexMap::new(),
        }
    }

    pub fn add_result(&mut self, op: OpResult) {
        self.operations.insert(op.label.clone(), op);
    }

    pub fn operation(&self, label: &str) -> Option<&OpResult> {
        self.operations.get(label)
    }

    pub fn end_date_time(&self) -> Option<DateTime<Utc>> {
        let duration = chrono::Duration::milliseconds(i64::try_from(self.duration_ms).ok()?);
        self.start_date_time.map(|start| start + duration)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMachine {
    pub hostname: String,
    pub cpu: String,
    pub cpu_count: usize,
    pub os: String,
    pub memory_mb: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub revision: u64,
    pub version_short: String,
    pub version_long: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuiteRun {
    pub label: String,
    pub machine: TestMachine,
    pub build_tested: BuildInfo,
    pub start_date_time: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub test_results: Vec<TestResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_result_unit_follows_kind() {
        let duration = OpResult::duration_ms("ToLogin", 1500.0, "");
        let size = OpResult::file_size_kb("FileSize", 2048.0, "");

        assert!((duration.display_value() - 1.5).abs() < f64::EPSILON);
        assert!((size.display_value() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_test_result_json_uses_camel_case() {
        let mut result = TestResult::new("DPT1");
        result.add_result(OpResult::duration_ms("ToLogin", 100.0, "line"));

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["testLabel"], "DPT1");
        assert_eq!(json["status"], "passed");
        assert_eq!(json["operations"]["ToLogin"]["kind"], "durationMs");
        assert!(json["operations"]["ToLogin"].get("sourceLine").is_none());
        assert!(json.get("averages").is_none());
    }

    #[test]
    fn test_end_date_time_adds_duration() {
        let mut result = TestResult::new("X");
        assert!(result.end_date_time().is_none());

        let start = Utc::now();
        result.start_date_time = Some(start);
        result.duration_ms = 2500;

        assert_eq!(
            result.end_date_time().unwrap(),
            start + chrono::Duration::milliseconds(2500)
        );
    }
}
