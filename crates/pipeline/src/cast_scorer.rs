//! Point-in-time actor scoring.
//!
//! Turns a variable-length cast list into `n_actors` numeric features: for
//! each billing slot, the actor's running average audience score as it stood
//! strictly before the movie's release date.
//!
//! ## Algorithm
//! Fit walks the (date-sorted) training movies once and, for every actor
//! appearance, records the actor's cumulative mean score including that
//! movie. Each actor's entries are kept sorted by `(date, training row)`.
//!
//! Transform binary-searches each slot's actor for the last entry dated
//! before the movie, so a movie can never see its own score or any later
//! one. Slot values are then aggregated (`actor_mean`, `n_scores`) and
//! back-filled from later slots.

use crate::error::{PipelineError, Result};
use crate::frame::FeatureFrame;
use crate::traits::Transformer;
use chrono::NaiveDate;
use data_loader::{COLD_START_ACTOR, MovieRecord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Number of billing slots encoded when nothing else is configured.
pub const DEFAULT_N_ACTORS: usize = 9;

pub const ACTOR_MEAN_COLUMN: &str = "actor_mean";
pub const N_SCORES_COLUMN: &str = "n_scores";

/// Column name for a billing slot (`actor_0` is the lead).
pub fn slot_column(slot: usize) -> String {
    format!("actor_{}", slot)
}

/// Unfitted scorer: just the slot count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalCastScorer {
    n_actors: usize,
}

impl TemporalCastScorer {
    pub fn new(n_actors: usize) -> Result<Self> {
        if n_actors == 0 {
            return Err(PipelineError::Configuration(
                "n_actors must be at least 1".to_string(),
            ));
        }
        Ok(Self { n_actors })
    }

    pub fn n_actors(&self) -> usize {
        self.n_actors
    }

    /// Build the actor history from scored training movies.
    ///
    /// `movies` must already be sorted by date: running averages accumulate
    /// in input order. Every appearance yields one entry, so an actor billed
    /// twice in one movie gets two.
    pub fn fit(&self, movies: &[MovieRecord]) -> Result<ActorHistory> {
        if movies.is_empty() {
            return Err(PipelineError::Configuration(
                "cannot build actor history from an empty training set".to_string(),
            ));
        }

        let mut running: HashMap<&str, (f64, usize)> = HashMap::new();
        let mut entries: HashMap<String, Vec<HistoryEntry>> = HashMap::new();

        for (row, movie) in movies.iter().enumerate() {
            let score = match movie.score {
                Some(score) if score.is_finite() => score,
                _ => {
                    return Err(PipelineError::Configuration(format!(
                        "training movie at row {} ({:?}) has no score",
                        row, movie.title
                    )));
                }
            };

            for actor in &movie.cast {
                if actor == COLD_START_ACTOR {
                    continue;
                }
                let (sum, count) = running.entry(actor.as_str()).or_insert((0.0, 0));
                *sum += score;
                *count += 1;
                entries.entry(actor.clone()).or_default().push(HistoryEntry {
                    date: movie.date,
                    avg_score: *sum / *count as f64,
                    row,
                });
            }
        }

        // Stable: a duplicate billing within one movie keeps billing order.
        for history in entries.values_mut() {
            history.sort_by_key(|e| (e.date, e.row));
        }

        let history = ActorHistory {
            n_actors: self.n_actors,
            entries,
        };
        info!(
            "Built actor history: {} actors, {} appearances",
            history.actor_count(),
            history.len()
        );
        Ok(history)
    }
}

impl Default for TemporalCastScorer {
    fn default() -> Self {
        Self {
            n_actors: DEFAULT_N_ACTORS,
        }
    }
}

/// One actor appearance seen at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    /// Mean of the actor's scores over appearances up to and including this one
    pub avg_score: f64,
    /// Position of the movie in the training input; breaks same-date ties
    pub row: usize,
}

/// Fitted, immutable actor history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorHistory {
    n_actors: usize,
    entries: HashMap<String, Vec<HistoryEntry>>,
}

impl ActorHistory {
    pub fn n_actors(&self) -> usize {
        self.n_actors
    }

    /// Entries for an actor, ascending by `(date, row)`.
    pub fn entries(&self, actor: &str) -> &[HistoryEntry] {
        self.entries
            .get(actor)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct actors with history.
    pub fn actor_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of history entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The actor's running average as of the last appearance strictly before
    /// `date`. Same-date entries resolve to the latest training row.
    pub fn score_before(&self, actor: &str, date: NaiveDate) -> Option<f64> {
        let entries = self.entries.get(actor)?;
        let idx = entries.partition_point(|e| e.date < date);
        idx.checked_sub(1).map(|i| entries[i].avg_score)
    }

    /// Per-slot lookups for one movie.
    pub fn score_movie(&self, row: usize, movie: &MovieRecord) -> CastSlots {
        let values = (0..self.n_actors)
            .map(|slot| self.score_before(movie.actor_at(slot), movie.date))
            .collect();
        CastSlots { row, values }
    }
}

impl Transformer for ActorHistory {
    fn name(&self) -> &str {
        "TemporalCastScorer"
    }

    fn transform(&self, mut frame: FeatureFrame) -> Result<FeatureFrame> {
        let scored: Vec<CastSlots> = frame
            .records()
            .par_iter()
            .enumerate()
            .map(|(row, movie)| self.score_movie(row, movie))
            .collect();

        let mut slot_columns = vec![Vec::with_capacity(scored.len()); self.n_actors];
        let mut means = Vec::with_capacity(scored.len());
        let mut counts = Vec::with_capacity(scored.len());
        let mut undefined = 0usize;

        for slots in &scored {
            let mean = slots.actor_mean().unwrap_or_else(|_| {
                undefined += 1;
                f64::NAN
            });
            means.push(mean);
            counts.push(slots.n_scores() as f64);

            for (column, value) in slot_columns.iter_mut().zip(slots.backfilled()) {
                column.push(value.unwrap_or(f64::NAN));
            }
        }

        if undefined > 0 {
            debug!(
                "{} of {} movies have no prior-scored cast; actor_mean left undefined",
                undefined,
                scored.len()
            );
        }

        for (slot, values) in slot_columns.into_iter().enumerate() {
            frame.push_column(slot_column(slot), values)?;
        }
        frame.push_column(ACTOR_MEAN_COLUMN, means)?;
        frame.push_column(N_SCORES_COLUMN, counts)?;
        Ok(frame)
    }
}

/// Slot lookups for a single movie, before back-fill.
#[derive(Debug, Clone, PartialEq)]
pub struct CastSlots {
    row: usize,
    values: Vec<Option<f64>>,
}

impl CastSlots {
    pub fn new(row: usize, values: Vec<Option<f64>>) -> Self {
        Self { row, values }
    }

    /// Raw per-slot values; `None` means no prior score.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Count of slots with a prior score.
    pub fn n_scores(&self) -> usize {
        self.values.iter().flatten().count()
    }

    /// Mean over slots with a prior score.
    ///
    /// # Errors
    /// `UndefinedAggregate` when every slot is missing; zero would read as a
    /// real (terrible) score.
    pub fn actor_mean(&self) -> Result<f64> {
        let n = self.n_scores();
        if n == 0 {
            return Err(PipelineError::UndefinedAggregate { row: self.row });
        }
        Ok(self.values.iter().flatten().sum::<f64>() / n as f64)
    }

    /// Slot values with each gap filled from the nearest later slot.
    pub fn backfilled(&self) -> Vec<Option<f64>> {
        backfill(&self.values)
    }
}

/// Replace each `None` with the first `Some` at or after it.
pub fn backfill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut filled = values.to_vec();
    let mut next = None;
    for value in filled.iter_mut().rev() {
        match value {
            Some(_) => next = *value,
            None => *value = next,
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn movie(on: NaiveDate, cast: &[&str], score: Option<f64>) -> MovieRecord {
        let mut record = MovieRecord::new(
            on,
            vec![],
            cast.iter().map(|a| a.to_string()).collect(),
            "en",
            0.0,
            "US",
        );
        record.score = score;
        record
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_n_actors_must_be_positive() {
        assert!(matches!(
            TemporalCastScorer::new(0),
            Err(PipelineError::Configuration(_))
        ));
        assert_eq!(TemporalCastScorer::default().n_actors(), DEFAULT_N_ACTORS);
    }

    #[test]
    fn test_fit_rejects_empty_training_set() {
        let scorer = TemporalCastScorer::new(3).unwrap();
        assert!(matches!(
            scorer.fit(&[]),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_fit_rejects_unscored_movie() {
        let scorer = TemporalCastScorer::new(3).unwrap();
        let movies = vec![
            movie(date(2000, 1, 1), &["A"], Some(0.5)),
            movie(date(2000, 1, 2), &["A"], None),
        ];
        assert!(matches!(
            scorer.fit(&movies),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_fit_records_running_mean_per_appearance() {
        let scorer = TemporalCastScorer::new(1).unwrap();
        let movies = vec![
            movie(date(2000, 1, 1), &["A"], Some(0.5)),
            movie(date(2000, 2, 1), &["A", "B"], Some(0.7)),
            movie(date(2000, 3, 1), &["A"], Some(0.9)),
        ];
        let history = scorer.fit(&movies).unwrap();

        let a: Vec<f64> = history.entries("A").iter().map(|e| e.avg_score).collect();
        assert_eq!(a.len(), 3);
        assert_close(a[0], 0.5);
        assert_close(a[1], 0.6);
        assert_close(a[2], 0.7);
        assert_eq!(history.entries("B").len(), 1);
        assert_eq!(history.len(), 4);
        assert_eq!(history.actor_count(), 2);
    }

    #[test]
    fn test_placeholder_never_enters_history() {
        let scorer = TemporalCastScorer::new(2).unwrap();
        let movies = vec![movie(date(2000, 1, 1), &["A", COLD_START_ACTOR], Some(0.4))];
        let history = scorer.fit(&movies).unwrap();

        assert!(history.entries(COLD_START_ACTOR).is_empty());
        assert_eq!(history.score_before(COLD_START_ACTOR, date(2030, 1, 1)), None);
    }

    #[test]
    fn test_duplicate_billing_is_two_appearances() {
        let scorer = TemporalCastScorer::new(2).unwrap();
        let movies = vec![
            movie(date(2000, 1, 1), &["A"], Some(0.2)),
            movie(date(2000, 2, 1), &["A", "A"], Some(0.8)),
        ];
        let history = scorer.fit(&movies).unwrap();

        let a: Vec<f64> = history.entries("A").iter().map(|e| e.avg_score).collect();
        assert_eq!(a.len(), 3);
        assert_close(a[1], 0.5);
        assert_close(a[2], 0.6);
        assert_close(history.score_before("A", date(2000, 3, 1)).unwrap(), 0.6);
    }

    #[test]
    fn test_lookup_is_strictly_before() {
        let scorer = TemporalCastScorer::new(1).unwrap();
        let movies = vec![
            movie(date(2000, 1, 1), &["A"], Some(0.5)),
            movie(date(2000, 2, 1), &["A"], Some(0.9)),
        ];
        let history = scorer.fit(&movies).unwrap();

        assert_eq!(history.score_before("A", date(2000, 1, 1)), None);
        assert_close(history.score_before("A", date(2000, 1, 2)).unwrap(), 0.5);
        // Same-day entry is excluded
        assert_close(history.score_before("A", date(2000, 2, 1)).unwrap(), 0.5);
        assert_close(history.score_before("A", date(2000, 2, 2)).unwrap(), 0.7);
    }

    #[test]
    fn test_same_date_ties_take_latest_row() {
        let scorer = TemporalCastScorer::new(1).unwrap();
        let movies = vec![
            movie(date(2000, 1, 1), &["A"], Some(0.2)),
            movie(date(2000, 1, 1), &["A"], Some(0.6)),
        ];
        let history = scorer.fit(&movies).unwrap();

        // Second row's running mean (0.2 + 0.6) / 2 wins the tie
        assert_close(history.score_before("A", date(2000, 1, 2)).unwrap(), 0.4);
    }

    #[test]
    fn test_first_appearance_is_cold_start() {
        let scorer = TemporalCastScorer::new(1).unwrap();
        let movies = vec![movie(date(2000, 1, 1), &["A"], Some(0.5))];
        let history = scorer.fit(&movies).unwrap();

        let slots = history.score_movie(0, &movies[0]);
        assert_eq!(slots.values(), &[None]);
        assert_eq!(slots.n_scores(), 0);
    }

    #[test]
    fn test_backfill_borrows_from_later_slots() {
        let filled = backfill(&[None, Some(0.7), None, Some(0.3)]);
        assert_eq!(filled, vec![Some(0.7), Some(0.7), Some(0.3), Some(0.3)]);
    }

    #[test]
    fn test_backfill_leaves_trailing_gaps() {
        assert_eq!(backfill(&[Some(0.4), None]), vec![Some(0.4), None]);
        assert_eq!(backfill(&[None, None]), vec![None, None]);
    }

    #[test]
    fn test_aggregate_excludes_missing() {
        let slots = CastSlots::new(0, vec![Some(0.6), None, Some(0.8)]);
        assert_close(slots.actor_mean().unwrap(), 0.7);
        assert_eq!(slots.n_scores(), 2);
    }

    #[test]
    fn test_all_missing_aggregate_is_undefined() {
        let slots = CastSlots::new(4, vec![None, None, None]);
        assert_eq!(
            slots.actor_mean(),
            Err(PipelineError::UndefinedAggregate { row: 4 })
        );
        assert_eq!(slots.n_scores(), 0);
    }

    #[test]
    fn test_end_to_end_running_mean() {
        let scorer = TemporalCastScorer::new(1).unwrap();
        let train = vec![
            movie(date(2001, 1, 1), &["A"], Some(0.5)),
            movie(date(2002, 1, 1), &["A"], Some(0.7)),
            movie(date(2003, 1, 1), &["A"], Some(0.9)),
        ];
        let history = scorer.fit(&train).unwrap();

        let future = movie(date(2004, 1, 1), &["A"], None);
        let frame = history
            .transform(FeatureFrame::from_records(vec![future]))
            .unwrap();

        assert_close(frame.column("actor_0").unwrap()[0], 0.7);
        assert_close(frame.column(ACTOR_MEAN_COLUMN).unwrap()[0], 0.7);
        assert_eq!(frame.column(N_SCORES_COLUMN).unwrap()[0], 1.0);
    }

    #[test]
    fn test_short_cast_slot_order() {
        let scorer = TemporalCastScorer::new(2).unwrap();
        let train = vec![movie(date(2001, 1, 1), &["A"], Some(0.4))];
        let history = scorer.fit(&train).unwrap();

        let target = movie(date(2002, 1, 1), &["A", COLD_START_ACTOR], None);
        let frame = history
            .transform(FeatureFrame::from_records(vec![target]))
            .unwrap();

        assert_close(frame.column("actor_0").unwrap()[0], 0.4);
        assert!(frame.column("actor_1").unwrap()[0].is_nan());
        assert_close(frame.column(ACTOR_MEAN_COLUMN).unwrap()[0], 0.4);
        assert_eq!(frame.column(N_SCORES_COLUMN).unwrap()[0], 1.0);
    }

    #[test]
    fn test_unknown_cast_produces_nan_mean() {
        let scorer = TemporalCastScorer::new(3).unwrap();
        let history = scorer
            .fit(&[movie(date(2001, 1, 1), &["A"], Some(0.4))])
            .unwrap();

        let frame = history
            .transform(FeatureFrame::from_records(vec![movie(
                date(2002, 1, 1),
                &["Nobody"],
                None,
            )]))
            .unwrap();

        assert!(frame.column(ACTOR_MEAN_COLUMN).unwrap()[0].is_nan());
        assert_eq!(frame.column(N_SCORES_COLUMN).unwrap()[0], 0.0);
        for slot in 0..3 {
            assert!(frame.column(&slot_column(slot)).unwrap()[0].is_nan());
        }
    }

    #[test]
    fn test_self_scoring_uses_only_prior_movies() {
        let scorer = TemporalCastScorer::new(2).unwrap();
        let train = vec![
            movie(date(2000, 1, 1), &["A", "B"], Some(0.2)),
            movie(date(2000, 6, 1), &["B", "A"], Some(0.6)),
            movie(date(2001, 1, 1), &["A"], Some(1.0)),
        ];
        let history = scorer.fit(&train).unwrap();
        let frame = history
            .transform(FeatureFrame::from_records(train.clone()))
            .unwrap();

        let lead = frame.column("actor_0").unwrap();
        assert!(lead[0].is_nan());
        assert_close(lead[1], 0.2);
        assert_close(lead[2], 0.4);

        // Brute force: every looked-up value must come from an earlier-dated entry
        for (row, m) in train.iter().enumerate() {
            for slot in 0..2 {
                let expected = history
                    .entries(m.actor_at(slot))
                    .iter()
                    .filter(|e| e.date < m.date)
                    .last()
                    .map(|e| e.avg_score);
                assert_eq!(history.score_movie(row, m).values()[slot], expected);
            }
        }
    }

    #[test]
    fn test_transform_is_idempotent() {
        let scorer = TemporalCastScorer::new(3).unwrap();
        let train = vec![
            movie(date(2000, 1, 1), &["A", "B", "C"], Some(0.3)),
            movie(date(2000, 3, 1), &["C", "A"], Some(0.8)),
            movie(date(2000, 5, 1), &["B"], Some(0.5)),
        ];
        let history = scorer.fit(&train).unwrap();

        let once = history
            .transform(FeatureFrame::from_records(train.clone()))
            .unwrap();
        let twice = history
            .transform(FeatureFrame::from_records(train.clone()))
            .unwrap();

        assert_eq!(once.column_names(), twice.column_names());
        for column in once.columns() {
            let other = twice.column(&column.name).unwrap();
            for (a, b) in column.values.iter().zip(other) {
                assert!(a == b || (a.is_nan() && b.is_nan()));
            }
        }
    }
}
