use thiserror::Error;

/// Errors raised while fitting or applying the regressor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoosterError {
    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("Got {rows} feature rows but {targets} targets")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("Expected {expected} features per row, found {found}")]
    FeatureCount { expected: usize, found: usize },

    #[error("Target at row {row} is not a finite number")]
    InvalidTarget { row: usize },

    #[error("Invalid booster configuration: {0}")]
    InvalidConfig(String),

    #[error("Regressor must be fit before predict")]
    NotFitted,
}

pub type Result<T> = std::result::Result<T, BoosterError>;
