//! Loading the dataset and splitting it chronologically.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::{MovieDataset, MovieRecord};
use std::path::Path;
use tracing::info;

/// Fraction of the (date-ordered) dataset held out for testing by default.
pub const DEFAULT_TEST_FRACTION: f64 = 0.25;

impl MovieDataset {
    /// Load, clean and date-sort the IMDB movies CSV.
    pub fn load_from_csv(path: &Path) -> Result<Self> {
        info!("Loading movie dataset from {:?}", path);
        let movies = parser::parse_movies_csv(path)?;
        if movies.is_empty() {
            return Err(DataLoadError::EmptyDataset(format!(
                "no released movies in {}",
                path.display()
            )));
        }

        let dataset = Self::from_records(movies);
        info!("Loaded {} released movies", dataset.len());
        Ok(dataset)
    }

    /// Split into (train, test) without shuffling.
    ///
    /// The test side is the most recent `ceil(n * test_fraction)` movies, so
    /// every test movie is dated on or after every training movie.
    pub fn train_test_split(&self, test_fraction: f64) -> Result<(Vec<MovieRecord>, Vec<MovieRecord>)> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(DataLoadError::InvalidValue {
                field: "test_fraction".to_string(),
                value: test_fraction.to_string(),
            });
        }

        let n = self.movies.len();
        let n_test = (n as f64 * test_fraction).ceil() as usize;
        let n_train = n.saturating_sub(n_test);
        if n_train == 0 || n_test == 0 {
            return Err(DataLoadError::EmptyDataset(format!(
                "cannot split {} movies with test fraction {}",
                n, test_fraction
            )));
        }

        let (train, test) = self.movies.split_at(n_train);
        Ok((train.to_vec(), test.to_vec()))
    }
}
