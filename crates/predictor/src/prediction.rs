//! # Prediction Pipeline
//!
//! Couples the feature assembler with the boosted regressor:
//! 1. Attach targets to the training movies
//! 2. Fit the assembler and build the training matrix
//! 3. Fit the regressor on that matrix
//! 4. Pair the regressor's importances with the column names
//!
//! Predict, score and inference only transform; they never refit.

use std::cmp::Ordering;
use std::time::Instant;

use booster::GradientBoostedRegressor;
use chrono::NaiveDate;
use data_loader::MovieRecord;
use pipeline::{FeatureAssembler, PipelineError, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;

/// One column's share of the regressor's split gain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Feature assembler plus regressor, fitted together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionPipeline {
    config: PipelineConfig,
    assembler: FeatureAssembler,
    regressor: GradientBoostedRegressor,
    feature_importance: Vec<FeatureImportance>,
}

impl PredictionPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let assembler = FeatureAssembler::new(config.n_actors)?;
        let regressor = GradientBoostedRegressor::new(config.booster.clone())?;
        Ok(Self {
            config,
            assembler,
            regressor,
            feature_importance: Vec::new(),
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.assembler.is_fitted() && self.regressor.is_fitted()
    }

    /// Fit on date-ordered training movies and their targets.
    ///
    /// # Errors
    /// `Configuration` if `movies` and `targets` differ in length; anything
    /// the assembler or regressor rejects.
    pub fn fit(&mut self, movies: &[MovieRecord], targets: &[f64]) -> Result<()> {
        if movies.len() != targets.len() {
            return Err(PipelineError::Configuration(format!(
                "{} movies but {} targets",
                movies.len(),
                targets.len()
            ))
            .into());
        }

        let start_time = Instant::now();
        let labelled: Vec<MovieRecord> = movies
            .iter()
            .zip(targets)
            .map(|(movie, &target)| movie.clone().with_score(target))
            .collect();

        let matrix = self.assembler.fit_transform(&labelled)?;
        info!(
            "Built training matrix: {} rows x {} features",
            matrix.n_rows(),
            matrix.n_features()
        );

        self.regressor.fit(&matrix.rows, targets)?;
        self.feature_importance =
            rank_importances(&matrix.names, self.regressor.feature_importances()?);

        info!(
            "Fitted prediction pipeline on {} movies in {:.2?}",
            movies.len(),
            start_time.elapsed()
        );
        Ok(())
    }

    /// Predicted (normalised) score per movie.
    pub fn predict(&self, movies: &[MovieRecord]) -> Result<Vec<f64>> {
        let matrix = self.assembler.transform(movies)?;
        Ok(self.regressor.predict(&matrix.rows)?)
    }

    /// Coefficient of determination R² on held-out movies.
    pub fn score(&self, movies: &[MovieRecord], targets: &[f64]) -> Result<f64> {
        if movies.len() != targets.len() {
            return Err(PipelineError::Configuration(format!(
                "{} movies but {} targets",
                movies.len(),
                targets.len()
            ))
            .into());
        }
        let matrix = self.assembler.transform(movies)?;
        Ok(self.regressor.score(&matrix.rows, targets)?)
    }

    /// Predict one movie from raw inputs.
    ///
    /// # Errors
    /// - `Unfitted` before [`fit`](Self::fit)
    /// - `Validation` if `date` is not `YYYY-MM-DD` or `budget` is negative
    ///   or not finite
    pub fn inference(
        &self,
        date: &str,
        genre: &[String],
        cast: &[String],
        lang: &str,
        budget: f64,
        country: &str,
    ) -> Result<f64> {
        self.assembler.fitted()?;

        let date = parse_inference_date(date)?;
        if !(budget.is_finite() && budget >= 0.0) {
            return Err(ValidationError::InvalidBudget(budget.to_string()).into());
        }

        let movie = MovieRecord::new(
            date,
            trimmed(genre),
            trimmed(cast),
            lang.trim(),
            budget,
            country.trim(),
        );
        let predictions = self.predict(std::slice::from_ref(&movie))?;
        Ok(predictions[0])
    }

    /// Importances sorted descending; empty before fit.
    pub fn feature_importance(&self) -> &[FeatureImportance] {
        &self.feature_importance
    }
}

/// Parse a budget typed by a person: `,` and `_` separators are ignored.
pub fn parse_budget(input: &str) -> std::result::Result<f64, ValidationError> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    match cleaned.parse::<f64>() {
        Ok(budget) if budget.is_finite() && budget >= 0.0 => Ok(budget),
        _ => Err(ValidationError::InvalidBudget(input.to_string())),
    }
}

fn parse_inference_date(input: &str) -> std::result::Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::UnparseableDate(input.to_string()))
}

fn trimmed(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Pair names with importances, highest first. Ties keep column order.
fn rank_importances(names: &[String], importances: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = names
        .iter()
        .zip(importances)
        .map(|(feature, &importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use booster::BoosterConfig;

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            n_actors: 2,
            booster: BoosterConfig {
                n_estimators: 20,
                max_depth: 3,
                ..Default::default()
            },
        }
    }

    /// Lead actor "Star" always scores high, "Extra" low.
    fn catalogue() -> (Vec<MovieRecord>, Vec<f64>) {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let movies: Vec<MovieRecord> = (0..40)
            .map(|i| {
                let lead = if i % 2 == 0 { "Star" } else { "Extra" };
                MovieRecord::new(
                    start + chrono::Duration::days(30 * i),
                    vec!["Drama".to_string()],
                    vec![lead.to_string(), "Support".to_string()],
                    "en",
                    1_000_000.0 * (i % 5) as f64,
                    "US",
                )
            })
            .collect();
        let targets = (0..40).map(|i| if i % 2 == 0 { 0.8 } else { 0.4 }).collect();
        (movies, targets)
    }

    fn fitted() -> PredictionPipeline {
        let (movies, targets) = catalogue();
        let mut pipeline = PredictionPipeline::new(small_config()).unwrap();
        pipeline.fit(&movies, &targets).unwrap();
        pipeline
    }

    #[test]
    fn test_fit_rejects_length_mismatch() {
        let (movies, _) = catalogue();
        let mut pipeline = PredictionPipeline::new(small_config()).unwrap();
        let err = pipeline.fit(&movies, &[0.5]).unwrap_err();
        assert!(matches!(
            err,
            crate::PredictionError::Pipeline(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_calls_before_fit_are_unfitted() {
        let (movies, targets) = catalogue();
        let pipeline = PredictionPipeline::new(small_config()).unwrap();
        assert!(pipeline.predict(&movies).unwrap_err().is_unfitted());
        assert!(pipeline.score(&movies, &targets).unwrap_err().is_unfitted());
        assert!(
            pipeline
                .inference("2020-01-01", &[], &[], "en", 1.0, "US")
                .unwrap_err()
                .is_unfitted()
        );
        assert!(pipeline.feature_importance().is_empty());
    }

    #[test]
    fn test_importance_sorted_and_named() {
        let pipeline = fitted();
        let importance = pipeline.feature_importance();
        assert!(!importance.is_empty());
        assert!(
            importance
                .windows(2)
                .all(|w| w[0].importance >= w[1].importance)
        );
        assert!(importance.iter().any(|f| f.feature == "actor_0"));
    }

    #[test]
    fn test_inference_uses_actor_history() {
        let pipeline = fitted();
        let star = pipeline
            .inference(
                "2010-06-01",
                &["Drama".to_string()],
                &["Star".to_string()],
                "en",
                1_000_000.0,
                "US",
            )
            .unwrap();
        let extra = pipeline
            .inference(
                "2010-06-01",
                &["Drama".to_string()],
                &["Extra".to_string()],
                "en",
                1_000_000.0,
                "US",
            )
            .unwrap();
        assert!(star > extra);
    }

    #[test]
    fn test_inference_validation_errors() {
        let pipeline = fitted();
        let bad_date = pipeline
            .inference("01/02/2020", &[], &[], "en", 1.0, "US")
            .unwrap_err();
        assert!(bad_date.is_validation());

        let bad_budget = pipeline
            .inference("2020-01-02", &[], &[], "en", -5.0, "US")
            .unwrap_err();
        assert!(bad_budget.is_validation());

        // The pipeline is still usable afterwards
        assert!(
            pipeline
                .inference("2020-01-02", &[], &[], "en", 5.0, "US")
                .is_ok()
        );
    }

    #[test]
    fn test_score_on_training_data_is_high() {
        let (movies, targets) = catalogue();
        let pipeline = fitted();
        assert!(pipeline.score(&movies, &targets).unwrap() > 0.5);
    }

    #[test]
    fn test_parse_budget_strips_separators() {
        assert_eq!(parse_budget("1,000,000").unwrap(), 1_000_000.0);
        assert_eq!(parse_budget(" 2_500.5 ").unwrap(), 2500.5);
        assert_eq!(
            parse_budget("lots"),
            Err(ValidationError::InvalidBudget("lots".to_string()))
        );
        assert!(parse_budget("-10").is_err());
        assert!(parse_budget("inf").is_err());
    }
}
