//! Prediction crate for the movie audience-score regressor.
//!
//! This crate couples the feature pipeline with the boosted regressor
//! (`PredictionPipeline`), wraps training and evaluation on the IMDB
//! dataset (`MovieModel`), and persists fitted models as JSON.

pub mod config;
pub mod error;
pub mod model;
pub mod prediction;

pub use config::PipelineConfig;
pub use error::{PredictionError, Result};
pub use model::MovieModel;
pub use prediction::{FeatureImportance, PredictionPipeline, parse_budget};
