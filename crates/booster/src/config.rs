//! Booster hyperparameters.

use crate::error::{BoosterError, Result};
use serde::{Deserialize, Serialize};

/// Hyperparameters for [`GradientBoostedRegressor`](crate::GradientBoostedRegressor).
///
/// Missing fields take their defaults when deserialized, so a config file
/// only has to name what it changes:
/// ```json
/// { "n_estimators": 300, "learning_rate": 0.1 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Shrinkage applied to every leaf value (eta)
    pub learning_rate: f64,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// L2 regularisation on leaf weights
    pub lambda: f64,
    /// Minimum loss reduction required to split a node
    pub gamma: f64,
    /// Minimum hessian sum in each child of a split
    pub min_child_weight: f64,
    /// Fraction of rows drawn for each tree
    pub subsample: f64,
    /// Fraction of features drawn for each tree
    pub colsample_bytree: f64,
    /// Seed for row and feature sampling
    pub seed: u64,
}

impl Default for BoosterConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            seed: 0,
        }
    }
}

impl BoosterConfig {
    /// Reject settings the tree grower cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(invalid("n_estimators must be at least 1"));
        }
        if self.max_depth == 0 {
            return Err(invalid("max_depth must be at least 1"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(invalid(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        for (name, value) in [
            ("lambda", self.lambda),
            ("gamma", self.gamma),
            ("min_child_weight", self.min_child_weight),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("subsample", self.subsample),
            ("colsample_bytree", self.colsample_bytree),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(format!("{name} must be in (0, 1], got {value}")));
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> BoosterError {
    BoosterError::InvalidConfig(reason.into())
}
