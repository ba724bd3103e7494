//! Error type shared by the loader, the selection parser and the exporters.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// The input file does not exist.
    #[error("data file {} not found; make sure it is in the project folder", .path.display())]
    DataSourceMissing { path: PathBuf },

    /// The input exists but cannot be used as a comparative table.
    #[error("malformed data source: {0}")]
    DataSourceMalformed(String),

    #[error("unknown month label {label:?}{}", row_suffix(.row))]
    UnknownMonth { label: String, row: Option<usize> },

    #[error("unknown client {0:?}")]
    UnknownClient(String),

    /// A required numeric cell is blank or not a number.
    #[error("invalid value {value:?} in column {column} at row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

fn row_suffix(row: &Option<usize>) -> String {
    match row {
        Some(r) => format!(" at row {}", r),
        None => String::new(),
    }
}
