//! Core domain types for the IMDB movies dataset.
//!
//! A [`MovieRecord`] is the unit every later stage works on: the loader
//! produces them, the feature pipeline consumes them, and inference builds a
//! single one from user input.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder actor used for a cast slot that does not exist.
///
/// It is never a real actor: the cast scorer refuses to build history for it.
pub const COLD_START_ACTOR: &str = "~";

/// Raw IMDB scores run from 0 to 100; records carry them divided by this.
pub const SCORE_SCALE: f64 = 100.0;

/// One movie, cleaned and ready for feature engineering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// Display title. Not used as a feature.
    pub title: String,
    /// Release date
    pub date: NaiveDate,
    /// Genre labels in listing order
    pub genre: Vec<String>,
    /// Actor names in billing order; index 0 is the lead
    pub cast: Vec<String>,
    /// Original language code (e.g. "en")
    pub lang: String,
    pub budget: f64,
    /// ISO 3166 country code (e.g. "US")
    pub country: String,
    /// Audience score normalised to [0, 1]; `None` for unscored input
    pub score: Option<f64>,
}

impl MovieRecord {
    /// Build an unscored record, the shape inference requests take.
    pub fn new(
        date: NaiveDate,
        genre: Vec<String>,
        cast: Vec<String>,
        lang: impl Into<String>,
        budget: f64,
        country: impl Into<String>,
    ) -> Self {
        Self {
            title: String::new(),
            date,
            genre,
            cast,
            lang: lang.into(),
            budget,
            country: country.into(),
            score: None,
        }
    }

    /// Builder-style setter for the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder-style setter for the (normalised) score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Actor billed at `slot`, or the cold-start placeholder when the cast
    /// is shorter than `slot + 1`.
    pub fn actor_at(&self, slot: usize) -> &str {
        self.cast
            .get(slot)
            .map(String::as_str)
            .unwrap_or(COLD_START_ACTOR)
    }
}

/// A loaded dataset, kept in ascending date order.
#[derive(Debug, Clone, Default)]
pub struct MovieDataset {
    pub(crate) movies: Vec<MovieRecord>,
}

impl MovieDataset {
    /// Wrap records, sorting them by date.
    ///
    /// The sort is stable so same-day movies keep their file order; the cast
    /// scorer relies on that order when it accumulates running averages.
    pub fn from_records(mut movies: Vec<MovieRecord>) -> Self {
        movies.sort_by_key(|m| m.date);
        Self { movies }
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    pub fn into_movies(self) -> Vec<MovieRecord> {
        self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Targets of every record, `None` where a record is unscored.
    pub fn scores(&self) -> Vec<Option<f64>> {
        self.movies.iter().map(|m| m.score).collect()
    }
}
