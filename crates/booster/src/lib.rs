//! Gradient-boosted regression trees.
//!
//! A small XGBoost-style regressor: squared-error loss, depth-limited trees
//! grown level by level with exact greedy split search, L2-regularised leaf
//! weights, seeded row/column subsampling, and a learned default direction
//! for missing (`NaN`) feature values.
//!
//! ## Example Usage
//! ```ignore
//! use booster::{BoosterConfig, GradientBoostedRegressor};
//!
//! let mut regressor = GradientBoostedRegressor::new(BoosterConfig::default())?;
//! regressor.fit(&train_rows, &train_targets)?;
//! let r2 = regressor.score(&test_rows, &test_targets)?;
//! ```

pub mod booster;
pub mod config;
pub mod error;
pub mod metrics;
pub mod tree;

pub use booster::{BoostedModel, GradientBoostedRegressor};
pub use config::BoosterConfig;
pub use error::{BoosterError, Result};
pub use metrics::{r2_score, rmse};
pub use tree::{Node, RegressionTree};
