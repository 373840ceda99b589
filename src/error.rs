use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkbenchError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error in {}: {message}", path.display())]
    Xml { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse {what} from line '{line}'")]
    Parse { what: &'static str, line: String },

    #[error("Expected line {index} containing '{needle}' in {}", path.display())]
    MissingLine {
        path: PathBuf,
        needle: String,
        index: usize,
    },

    #[error("BOQ line {line_number}: {reason}")]
    Boq { line_number: usize, reason: String },

    #[error("Archiver failed for {}: {reason}", source_dir.display())]
    Archive { source_dir: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, WorkbenchError>;
