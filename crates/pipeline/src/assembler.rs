//! The FeatureAssembler runs every feature stage in a fixed order.
//!
//! Order: date features -> cast scorer -> genre multi-hot ->
//! language/country one-hot -> numeric-column selection.

use crate::cast_scorer::{
    ACTOR_MEAN_COLUMN, ActorHistory, N_SCORES_COLUMN, TemporalCastScorer, slot_column,
};
use crate::date_features::{DATE_COLUMNS, DateFeatures};
use crate::encoders::genre::genre_column;
use crate::encoders::{CategoryVocabulary, GenreEncoder, GenreVocabulary, OneHotEncoder};
use crate::error::{PipelineError, Result};
use crate::frame::{BUDGET_COLUMN, FeatureFrame, FeatureMatrix};
use crate::traits::Transformer;
use data_loader::MovieRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Unfitted stage configuration plus, once fitted, the snapshot.
///
/// ## Usage
/// ```ignore
/// let mut assembler = FeatureAssembler::new(9)?;
/// let train_matrix = assembler.fit_transform(&train)?;
/// let test_matrix = assembler.transform(&test)?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureAssembler {
    scorer: TemporalCastScorer,
    genre_encoder: GenreEncoder,
    one_hot: OneHotEncoder,
    fitted: Option<FittedAssembler>,
}

impl FeatureAssembler {
    /// Create an unfitted assembler encoding `n_actors` cast slots.
    pub fn new(n_actors: usize) -> Result<Self> {
        Ok(Self {
            scorer: TemporalCastScorer::new(n_actors)?,
            genre_encoder: GenreEncoder,
            one_hot: OneHotEncoder::default(),
            fitted: None,
        })
    }

    /// Fit every stateful stage on scored, date-sorted training movies.
    pub fn fit(&mut self, movies: &[MovieRecord]) -> Result<()> {
        let history = self.scorer.fit(movies)?;
        let genres = self.genre_encoder.fit(movies);
        let categories = self.one_hot.fit(movies);

        let fitted = FittedAssembler::new(history, genres, categories);
        info!(
            "FeatureAssembler fitted on {} movies ({} features)",
            movies.len(),
            fitted.feature_names().len()
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    /// Fit, then transform the same movies.
    pub fn fit_transform(&mut self, movies: &[MovieRecord]) -> Result<FeatureMatrix> {
        self.fit(movies)?;
        self.transform(movies)
    }

    /// Transform with the fitted snapshot.
    ///
    /// # Errors
    /// `Unfitted` if [`fit`](Self::fit) has not run.
    pub fn transform(&self, movies: &[MovieRecord]) -> Result<FeatureMatrix> {
        self.fitted()?.transform(movies)
    }

    /// The fitted snapshot.
    pub fn fitted(&self) -> Result<&FittedAssembler> {
        self.fitted.as_ref().ok_or(PipelineError::Unfitted {
            stage: "FeatureAssembler",
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }
}

/// Immutable result of fitting: the actor history, both vocabularies, and
/// the feature names the regressor will be trained against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedAssembler {
    history: ActorHistory,
    genres: GenreVocabulary,
    categories: CategoryVocabulary,
    feature_names: Vec<String>,
}

impl FittedAssembler {
    pub fn new(
        history: ActorHistory,
        genres: GenreVocabulary,
        categories: CategoryVocabulary,
    ) -> Self {
        let feature_names = expected_feature_names(&history, &genres, &categories);
        Self {
            history,
            genres,
            categories,
            feature_names,
        }
    }

    /// Selected column names, in matrix order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// The stages, in the order they must run. The scorer adds its slot
    /// columns before the categorical encoders see the frame.
    fn stages(&self) -> [&dyn Transformer; 4] {
        [&DateFeatures, &self.history, &self.genres, &self.categories]
    }

    /// Run all stages, then select the numeric columns.
    pub fn transform(&self, movies: &[MovieRecord]) -> Result<FeatureMatrix> {
        let mut frame = FeatureFrame::from_records(movies.to_vec());
        for stage in self.stages() {
            debug!(
                "Applying stage: {} (input columns: {})",
                stage.name(),
                frame.columns().len()
            );
            frame = stage.transform(frame)?;
            debug!(
                "Stage applied: {} (output columns: {})",
                stage.name(),
                frame.columns().len()
            );
        }

        let matrix = frame.to_matrix();
        if matrix.names != self.feature_names {
            return Err(PipelineError::FeatureMismatch {
                expected: self.feature_names.len(),
                found: matrix.names.len(),
            });
        }
        Ok(matrix)
    }
}

fn expected_feature_names(
    history: &ActorHistory,
    genres: &GenreVocabulary,
    categories: &CategoryVocabulary,
) -> Vec<String> {
    let mut names = vec![BUDGET_COLUMN.to_string()];
    names.extend(DATE_COLUMNS.iter().map(|c| c.to_string()));
    names.extend((0..history.n_actors()).map(slot_column));
    names.push(ACTOR_MEAN_COLUMN.to_string());
    names.push(N_SCORES_COLUMN.to_string());
    names.extend(genres.genres().iter().map(|g| genre_column(g)));
    names.extend(categories.column_names());
    names
}
