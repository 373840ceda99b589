//! Performance-report gathering from automated test-run logs.
//!
//! A test run folder holds one sub-folder per test (`DPT1`, `NTT4`, ...),
//! each with a `testrun.log` from the UI test tool and a
//! `data/pamir-perf.log` from the application under test.

mod collectors;
mod extract;
mod fields;
mod host;
mod legacy;
mod model;
mod report;

pub use legacy::{convert_directory, DEFAULT_SOURCE_DIR, DEFAULT_TARGET_DIR};
pub use report::{gather, GatherOptions, RESULTS_JSON_FILE};
