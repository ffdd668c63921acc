//! Error types for the prediction pipeline.

use booster::BoosterError;
use data_loader::DataLoadError;
use pipeline::{PipelineError, ValidationError};
use thiserror::Error;

/// Anything that can go wrong between raw movies and a predicted score.
#[derive(Error, Debug)]
pub enum PredictionError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Booster(#[from] BoosterError),

    #[error(transparent)]
    Data(#[from] DataLoadError),

    /// Reading or writing a model or config file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A model or config file is not valid JSON for its type
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ValidationError> for PredictionError {
    fn from(err: ValidationError) -> Self {
        PredictionError::Pipeline(PipelineError::Validation(err))
    }
}

impl PredictionError {
    /// True when the caller supplied malformed inference input and can
    /// simply retry with corrected values.
    pub fn is_validation(&self) -> bool {
        matches!(self, PredictionError::Pipeline(PipelineError::Validation(_)))
    }

    /// True when a predict/score/inference call came before fit.
    pub fn is_unfitted(&self) -> bool {
        matches!(
            self,
            PredictionError::Pipeline(PipelineError::Unfitted { .. })
                | PredictionError::Booster(BoosterError::NotFitted)
        )
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, PredictionError>;
