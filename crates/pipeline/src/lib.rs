//! Feature engineering for movie audience-score regression.
//!
//! This crate provides:
//! - `TemporalCastScorer`: leakage-free, point-in-time actor score features
//! - Genre multi-hot and language/country one-hot encoders
//! - Cyclic date features
//! - `FeatureAssembler` for running all of the above in a fixed order
//!
//! ## Architecture
//! Fitting a stage returns an immutable snapshot (`ActorHistory`,
//! `GenreVocabulary`, `CategoryVocabulary`); only snapshots implement
//! [`Transformer`]. The assembler chains them over a [`FeatureFrame`]:
//! 1. Date features (stateless)
//! 2. Cast scorer: `actor_0..actor_{n-1}`, `actor_mean`, `n_scores`
//! 3. Genre indicators
//! 4. Language and country indicators
//! 5. Numeric-column selection into a [`FeatureMatrix`]
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::FeatureAssembler;
//!
//! let mut assembler = FeatureAssembler::new(9)?;
//! let train_features = assembler.fit_transform(&train)?;
//! let test_features = assembler.transform(&test)?;
//! ```

pub mod assembler;
pub mod cast_scorer;
pub mod date_features;
pub mod encoders;
pub mod error;
pub mod frame;
pub mod traits;

// Re-export main types
pub use assembler::{FeatureAssembler, FittedAssembler};
pub use cast_scorer::{
    ActorHistory, CastSlots, DEFAULT_N_ACTORS, HistoryEntry, TemporalCastScorer,
};
pub use date_features::DateFeatures;
pub use error::{PipelineError, Result, ValidationError};
pub use frame::{FeatureFrame, FeatureMatrix};
pub use traits::Transformer;
