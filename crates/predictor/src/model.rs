//! Train-and-evaluate wrapper around [`PredictionPipeline`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use data_loader::{MovieDataset, MovieRecord};
use pipeline::PipelineError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::prediction::{FeatureImportance, PredictionPipeline};

/// Loads a dataset, holds out the most recent movies, fits on the rest and
/// remembers the held-out R².
///
/// ## Usage
/// ```ignore
/// let mut model = MovieModel::new(PipelineConfig::default());
/// model.fit_path(Path::new("data/imdb_movies.csv"), 0.25)?;
/// println!("Test R²: {:.4}", model.test_score()?);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieModel {
    config: PipelineConfig,
    pipeline: Option<PredictionPipeline>,
    test_score: Option<f64>,
}

impl MovieModel {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            pipeline: None,
            test_score: None,
        }
    }

    /// Load the IMDB CSV at `path`, then [`fit_dataset`](Self::fit_dataset).
    pub fn fit_path(&mut self, path: &Path, test_fraction: f64) -> Result<&mut Self> {
        let dataset = MovieDataset::load_from_csv(path)?;
        self.fit_dataset(&dataset, test_fraction)
    }

    /// Chronological split, fit on the older part, score on the newer.
    pub fn fit_dataset(
        &mut self,
        dataset: &MovieDataset,
        test_fraction: f64,
    ) -> Result<&mut Self> {
        let (train, test) = dataset.train_test_split(test_fraction)?;
        info!(
            "Split {} movies into {} train / {} test",
            dataset.len(),
            train.len(),
            test.len()
        );

        let mut pipeline = PredictionPipeline::new(self.config.clone())?;
        pipeline.fit(&train, &targets(&train)?)?;
        let test_score = pipeline.score(&test, &targets(&test)?)?;
        info!("Test R² score: {:.4}", test_score);

        self.pipeline = Some(pipeline);
        self.test_score = Some(test_score);
        Ok(self)
    }

    pub fn is_fitted(&self) -> bool {
        self.pipeline.is_some()
    }

    /// R² on the held-out movies.
    pub fn test_score(&self) -> Result<f64> {
        self.test_score.ok_or_else(|| unfitted().into())
    }

    /// Feature importances, highest first.
    pub fn feature_importance(&self) -> Result<&[FeatureImportance]> {
        Ok(self.pipeline()?.feature_importance())
    }

    pub fn pipeline(&self) -> Result<&PredictionPipeline> {
        self.pipeline.as_ref().ok_or_else(|| unfitted().into())
    }

    /// See [`PredictionPipeline::inference`].
    pub fn inference(
        &self,
        date: &str,
        genre: &[String],
        cast: &[String],
        lang: &str,
        budget: f64,
        country: &str,
    ) -> Result<f64> {
        self.pipeline()?
            .inference(date, genre, cast, lang, budget, country)
    }

    /// Write the model, fitted or not, as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        info!("Saved model to {:?}", path);
        Ok(())
    }

    /// Read a model written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let model: Self = serde_json::from_reader(reader)?;
        info!(
            "Loaded {} model from {:?}",
            if model.is_fitted() { "fitted" } else { "unfitted" },
            path
        );
        Ok(model)
    }
}

fn unfitted() -> PipelineError {
    PipelineError::Unfitted {
        stage: "MovieModel",
    }
}

fn targets(movies: &[MovieRecord]) -> Result<Vec<f64>> {
    movies
        .iter()
        .enumerate()
        .map(|(row, movie)| {
            movie.score.ok_or_else(|| {
                PipelineError::Configuration(format!("movie at row {row} has no score")).into()
            })
        })
        .collect()
}
