//! # Data Loader Crate
//!
//! Loads the IMDB movies CSV into cleaned, date-ordered [`MovieRecord`]s.
//!
//! ## Main Components
//!
//! - **types**: `MovieRecord`, `MovieDataset` and the shared constants
//! - **parser**: CSV parsing and per-field cleaning
//! - **dataset**: loading entry point and the chronological train/test split
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::MovieDataset;
//! use std::path::Path;
//!
//! let dataset = MovieDataset::load_from_csv(Path::new("data/imdb_movies.csv"))?;
//! let (train, test) = dataset.train_test_split(0.25)?;
//!
//! println!("{} training movies, {} test movies", train.len(), test.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod dataset;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use dataset::DEFAULT_TEST_FRACTION;
pub use types::{COLD_START_ACTOR, MovieDataset, MovieRecord, SCORE_SCALE};
