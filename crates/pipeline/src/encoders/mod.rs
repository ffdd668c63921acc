//! Categorical encoders: genre multi-hot, language/country one-hot.

pub mod genre;
pub mod one_hot;

// Re-export for convenience
pub use genre::{GenreEncoder, GenreVocabulary};
pub use one_hot::{CategoricalField, CategoryVocabulary, OneHotEncoder};
