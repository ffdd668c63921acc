//! Error types for the feature pipeline.

use thiserror::Error;

/// Errors raised while fitting or applying the feature pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Fit inputs are missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A stage was asked to transform before it was fitted
    #[error("{stage} must be fit before transform")]
    Unfitted { stage: &'static str },

    /// User-supplied inference input was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Every cast slot of a movie is missing, so the mean has no value
    #[error("Actor mean is undefined for row {row}: no cast slot has a prior score")]
    UndefinedAggregate { row: usize },

    /// Transform produced different numeric columns than fit did
    #[error("Feature mismatch: expected {expected} columns, found {found}")]
    FeatureMismatch { expected: usize, found: usize },

    /// A column does not have one value per row
    #[error("Column {name} has {found} values but the frame has {expected} rows")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Malformed inference input. Kept separate so callers can re-prompt
/// without tearing down a fitted pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unparseable date {0:?}: expected YYYY-MM-DD")]
    UnparseableDate(String),

    #[error("Invalid budget {0:?}: expected a non-negative number")]
    InvalidBudget(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, PipelineError>;
