//! Error types for the data-loader crate.
//!
//! Every failure carries enough context (file, line, field) to point at the
//! offending CSV row.

use thiserror::Error;

/// Errors that can occur while loading and cleaning the movie dataset
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected a record (bad quoting, wrong column count, ...)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row was readable but one of its fields could not be interpreted
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Nothing survived loading/filtering, or a split produced an empty side
    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
