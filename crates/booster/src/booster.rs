//! Gradient-boosted regression trees with squared-error loss.

use crate::config::BoosterConfig;
use crate::error::{BoosterError, Result};
use crate::metrics::{r2_score, rmse};
use crate::tree::{Node, RegressionTree, SortedColumns, TreeGrower};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Boosted ensemble. Missing feature values are passed as `NaN` and follow
/// the default direction each split learned during fit.
///
/// ## Usage
/// ```ignore
/// let mut regressor = GradientBoostedRegressor::new(BoosterConfig::default())?;
/// regressor.fit(&rows, &targets)?;
/// let predictions = regressor.predict(&test_rows)?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    config: BoosterConfig,
    model: Option<BoostedModel>,
}

/// The fitted ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedModel {
    n_features: usize,
    base_score: f64,
    trees: Vec<RegressionTree>,
    importances: Vec<f64>,
}

impl BoostedModel {
    fn predict_row(&self, row: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }
}

impl GradientBoostedRegressor {
    pub fn new(config: BoosterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            model: None,
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Result<&BoostedModel> {
        self.model.as_ref().ok_or(BoosterError::NotFitted)
    }

    /// Fit the ensemble. Refitting replaces any previous model.
    ///
    /// # Errors
    /// - `EmptyTrainingSet` if `rows` is empty
    /// - `LengthMismatch` if `rows` and `targets` differ in length
    /// - `FeatureCount` if rows are ragged
    /// - `InvalidTarget` if a target is NaN or infinite
    pub fn fit(&mut self, rows: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        if rows.is_empty() {
            return Err(BoosterError::EmptyTrainingSet);
        }
        if rows.len() != targets.len() {
            return Err(BoosterError::LengthMismatch {
                rows: rows.len(),
                targets: targets.len(),
            });
        }
        let n_features = rows[0].len();
        if let Some(row) = rows.iter().find(|r| r.len() != n_features) {
            return Err(BoosterError::FeatureCount {
                expected: n_features,
                found: row.len(),
            });
        }
        if let Some(row) = targets.iter().position(|t| !t.is_finite()) {
            return Err(BoosterError::InvalidTarget { row });
        }

        let n_rows = rows.len();
        let columns = SortedColumns::new(rows, n_features);
        let grower = TreeGrower::new(&columns, &self.config);
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let base_score = targets.iter().sum::<f64>() / n_rows as f64;
        let mut predictions = vec![base_score; n_rows];
        let hess = vec![1.0; n_rows];
        let mut trees = Vec::with_capacity(self.config.n_estimators);

        for round in 0..self.config.n_estimators {
            let grad: Vec<f64> = predictions
                .iter()
                .zip(targets)
                .map(|(p, y)| p - y)
                .collect();
            let sampled = self.sample_rows(&mut rng, n_rows);
            let features = self.sample_features(&mut rng, n_features);
            if !sampled.contains(&true) {
                debug!("Round {}: no rows sampled, skipping", round + 1);
                continue;
            }

            let tree = grower.grow(&grad, &hess, &sampled, &features);
            predictions
                .par_iter_mut()
                .zip(rows.par_iter())
                .for_each(|(p, row)| *p += tree.predict(row));
            trees.push(tree);

            if (round + 1) % 10 == 0 {
                debug!(
                    "Round {}: train RMSE {:.5}",
                    round + 1,
                    rmse(targets, &predictions)?
                );
            }
        }

        let importances = gain_importances(&trees, n_features);
        info!(
            "Fitted {} trees on {} rows x {} features (train RMSE {:.5})",
            trees.len(),
            n_rows,
            n_features,
            rmse(targets, &predictions)?
        );

        self.model = Some(BoostedModel {
            n_features,
            base_score,
            trees,
            importances,
        });
        Ok(())
    }

    /// Predict one value per row.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        let model = self.model()?;
        if let Some(row) = rows.iter().find(|r| r.len() != model.n_features) {
            return Err(BoosterError::FeatureCount {
                expected: model.n_features,
                found: row.len(),
            });
        }
        Ok(rows.par_iter().map(|row| model.predict_row(row)).collect())
    }

    /// R² of the predictions on `rows` against `targets`.
    pub fn score(&self, rows: &[Vec<f64>], targets: &[f64]) -> Result<f64> {
        let predictions = self.predict(rows)?;
        r2_score(targets, &predictions)
    }

    /// Average split gain per feature, normalised to sum to 1. Features
    /// never split on score 0.
    pub fn feature_importances(&self) -> Result<&[f64]> {
        Ok(&self.model()?.importances)
    }

    fn sample_rows(&self, rng: &mut StdRng, n_rows: usize) -> Vec<bool> {
        if self.config.subsample >= 1.0 {
            return vec![true; n_rows];
        }
        (0..n_rows)
            .map(|_| rng.random::<f64>() < self.config.subsample)
            .collect()
    }

    fn sample_features(&self, rng: &mut StdRng, n_features: usize) -> Vec<usize> {
        if self.config.colsample_bytree >= 1.0 || n_features == 0 {
            return (0..n_features).collect();
        }
        let amount = ((self.config.colsample_bytree * n_features as f64).ceil() as usize)
            .clamp(1, n_features);
        let mut features = rand::seq::index::sample(rng, n_features, amount).into_vec();
        features.sort_unstable();
        features
    }
}

fn gain_importances(trees: &[RegressionTree], n_features: usize) -> Vec<f64> {
    let mut total_gain = vec![0.0; n_features];
    let mut n_splits = vec![0usize; n_features];
    for node in trees.iter().flat_map(|t| t.nodes()) {
        if let Node::Split { feature, gain, .. } = node {
            total_gain[*feature] += gain;
            n_splits[*feature] += 1;
        }
    }

    let average: Vec<f64> = total_gain
        .iter()
        .zip(&n_splits)
        .map(|(g, &n)| if n == 0 { 0.0 } else { g / n as f64 })
        .collect();
    let sum: f64 = average.iter().sum();
    if sum > 0.0 {
        average.iter().map(|a| a / sum).collect()
    } else {
        average
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y depends on feature 0 only; feature 1 is noise-free filler.
    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let rows: Vec<Vec<f64>> = (0..100)
            .map(|i| vec![i as f64 / 100.0, ((i * 37) % 11) as f64])
            .collect();
        let targets = rows
            .iter()
            .map(|r| if r[0] < 0.5 { 0.2 } else { 0.8 })
            .collect();
        (rows, targets)
    }

    #[test]
    fn test_learns_step_function() {
        let (rows, targets) = step_data();
        let mut regressor = GradientBoostedRegressor::new(BoosterConfig::default()).unwrap();
        regressor.fit(&rows, &targets).unwrap();

        assert!(regressor.score(&rows, &targets).unwrap() > 0.99);
        let predictions = regressor.predict(&[vec![0.1, 3.0], vec![0.9, 3.0]]).unwrap();
        assert!((predictions[0] - 0.2).abs() < 0.02);
        assert!((predictions[1] - 0.8).abs() < 0.02);
    }

    #[test]
    fn test_more_rounds_reduce_training_error() {
        let (rows, targets) = step_data();
        let error_after = |n_estimators| {
            let mut regressor = GradientBoostedRegressor::new(BoosterConfig {
                n_estimators,
                learning_rate: 0.1,
                ..Default::default()
            })
            .unwrap();
            regressor.fit(&rows, &targets).unwrap();
            rmse(&targets, &regressor.predict(&rows).unwrap()).unwrap()
        };
        assert!(error_after(20) < error_after(2));
    }

    #[test]
    fn test_missing_values_learn_a_direction() {
        let mut rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        rows.extend((0..10).map(|_| vec![f64::NAN]));
        let targets: Vec<f64> = (0..20).map(|i| if i < 10 { 0.0 } else { 1.0 }).collect();

        let mut regressor = GradientBoostedRegressor::new(BoosterConfig::default()).unwrap();
        regressor.fit(&rows, &targets).unwrap();

        let predictions = regressor.predict(&[vec![f64::NAN], vec![4.0]]).unwrap();
        assert!((predictions[0] - 1.0).abs() < 0.05);
        assert!(predictions[1].abs() < 0.05);
    }

    #[test]
    fn test_importances_favour_informative_feature() {
        let (rows, targets) = step_data();
        let mut regressor = GradientBoostedRegressor::new(BoosterConfig::default()).unwrap();
        regressor.fit(&rows, &targets).unwrap();

        let importances = regressor.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn test_sampling_is_seeded() {
        let (rows, targets) = step_data();
        let config = BoosterConfig {
            subsample: 0.7,
            colsample_bytree: 0.5,
            seed: 7,
            ..Default::default()
        };
        let fit = || {
            let mut regressor = GradientBoostedRegressor::new(config.clone()).unwrap();
            regressor.fit(&rows, &targets).unwrap();
            regressor.predict(&rows).unwrap()
        };
        assert_eq!(fit(), fit());
    }

    #[test]
    fn test_empty_row_sample_skips_round() {
        let rows = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let targets = vec![0.1, 0.2, 0.3, 0.4];
        for seed in 0..20 {
            let mut regressor = GradientBoostedRegressor::new(BoosterConfig {
                n_estimators: 5,
                lambda: 0.0,
                subsample: 0.05,
                seed,
                ..Default::default()
            })
            .unwrap();
            regressor.fit(&rows, &targets).unwrap();

            let predictions = regressor.predict(&rows).unwrap();
            assert!(predictions.iter().all(|p| p.is_finite()), "seed {seed}");
            let json = serde_json::to_string(&regressor).unwrap();
            let restored: GradientBoostedRegressor = serde_json::from_str(&json).unwrap();
            assert!(restored.predict(&rows).unwrap()[0].is_finite());
        }
    }

    #[test]
    fn test_predict_before_fit() {
        let regressor = GradientBoostedRegressor::new(BoosterConfig::default()).unwrap();
        assert_eq!(
            regressor.predict(&[vec![1.0]]),
            Err(BoosterError::NotFitted)
        );
        assert!(regressor.feature_importances().is_err());
    }

    #[test]
    fn test_fit_input_errors() {
        let mut regressor = GradientBoostedRegressor::new(BoosterConfig::default()).unwrap();
        assert_eq!(
            regressor.fit(&[], &[]),
            Err(BoosterError::EmptyTrainingSet)
        );
        assert_eq!(
            regressor.fit(&[vec![1.0]], &[1.0, 2.0]),
            Err(BoosterError::LengthMismatch {
                rows: 1,
                targets: 2
            })
        );
        assert_eq!(
            regressor.fit(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0]),
            Err(BoosterError::FeatureCount {
                expected: 1,
                found: 2
            })
        );
        assert_eq!(
            regressor.fit(&[vec![1.0]], &[f64::NAN]),
            Err(BoosterError::InvalidTarget { row: 0 })
        );
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let (rows, targets) = step_data();
        let mut regressor = GradientBoostedRegressor::new(BoosterConfig {
            n_estimators: 3,
            ..Default::default()
        })
        .unwrap();
        regressor.fit(&rows, &targets).unwrap();
        assert_eq!(
            regressor.predict(&[vec![0.5]]),
            Err(BoosterError::FeatureCount {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_serialized_model_predicts_the_same() {
        let (rows, targets) = step_data();
        let mut regressor = GradientBoostedRegressor::new(BoosterConfig {
            n_estimators: 10,
            ..Default::default()
        })
        .unwrap();
        regressor.fit(&rows, &targets).unwrap();

        let json = serde_json::to_string(&regressor).unwrap();
        let restored: GradientBoostedRegressor = serde_json::from_str(&json).unwrap();
        let before = regressor.predict(&rows).unwrap();
        let after = restored.predict(&rows).unwrap();
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
