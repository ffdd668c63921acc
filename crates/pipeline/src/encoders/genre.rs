//! Genre multi-hot encoding.

use crate::error::Result;
use crate::frame::FeatureFrame;
use crate::traits::Transformer;
use data_loader::MovieRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Column name for a genre indicator.
pub fn genre_column(genre: &str) -> String {
    format!("genre_{}", genre)
}

/// Unfitted genre encoder.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GenreEncoder;

impl GenreEncoder {
    /// Collect the sorted set of genres seen in training.
    pub fn fit(&self, movies: &[MovieRecord]) -> GenreVocabulary {
        let genres: BTreeSet<&str> = movies
            .iter()
            .flat_map(|m| m.genre.iter().map(String::as_str))
            .filter(|g| !g.is_empty())
            .collect();

        GenreVocabulary {
            genres: genres.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Fitted genre vocabulary; one indicator column per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreVocabulary {
    genres: Vec<String>,
}

impl GenreVocabulary {
    pub fn genres(&self) -> &[String] {
        &self.genres
    }
}

impl Transformer for GenreVocabulary {
    fn name(&self) -> &str {
        "GenreEncoder"
    }

    fn transform(&self, mut frame: FeatureFrame) -> Result<FeatureFrame> {
        let indicators: Vec<Vec<f64>> = self
            .genres
            .iter()
            .map(|genre| {
                frame
                    .records()
                    .iter()
                    .map(|m| if m.genre.contains(genre) { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect();

        for (genre, values) in self.genres.iter().zip(indicators) {
            frame.push_column(genre_column(genre), values)?;
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn movie(genres: &[&str]) -> MovieRecord {
        MovieRecord::new(
            NaiveDate::from_ymd_opt(2012, 4, 11).unwrap(),
            genres.iter().map(|g| g.to_string()).collect(),
            vec![],
            "en",
            0.0,
            "US",
        )
    }

    #[test]
    fn test_vocabulary_is_sorted_and_clean() {
        let vocab = GenreEncoder.fit(&[
            movie(&["Drama", "Action"]),
            movie(&[]),
            movie(&["Action", ""]),
        ]);
        assert_eq!(vocab.genres(), &["Action".to_string(), "Drama".to_string()]);
    }

    #[test]
    fn test_multi_hot_ignores_unknown_genres() {
        let vocab = GenreEncoder.fit(&[movie(&["Drama", "Action"])]);
        let frame = vocab
            .transform(FeatureFrame::from_records(vec![
                movie(&["Action"]),
                movie(&["Western", "Drama"]),
            ]))
            .unwrap();

        assert_eq!(frame.column("genre_Action"), Some(&[1.0, 0.0][..]));
        assert_eq!(frame.column("genre_Drama"), Some(&[0.0, 1.0][..]));
        assert!(frame.column("genre_Western").is_none());
    }
}
