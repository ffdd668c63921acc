//! One-hot encoding of language and country.
//!
//! Categories unseen during fit encode as all zeros for their field.

use crate::error::Result;
use crate::frame::FeatureFrame;
use crate::traits::Transformer;
use data_loader::MovieRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A string field of [`MovieRecord`] that gets one-hot encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoricalField {
    Lang,
    Country,
}

impl CategoricalField {
    /// Column-name prefix, e.g. `lang` in `lang_en`.
    pub fn prefix(&self) -> &'static str {
        match self {
            CategoricalField::Lang => "lang",
            CategoricalField::Country => "country",
        }
    }

    fn value<'a>(&self, movie: &'a MovieRecord) -> &'a str {
        match self {
            CategoricalField::Lang => &movie.lang,
            CategoricalField::Country => &movie.country,
        }
    }
}

/// Unfitted one-hot encoder over a list of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    fields: Vec<CategoricalField>,
}

impl OneHotEncoder {
    pub fn new(fields: Vec<CategoricalField>) -> Self {
        Self { fields }
    }

    /// Collect each field's sorted category set.
    pub fn fit(&self, movies: &[MovieRecord]) -> CategoryVocabulary {
        let fields = self
            .fields
            .iter()
            .map(|&field| {
                let categories: BTreeSet<&str> = movies.iter().map(|m| field.value(m)).collect();
                (
                    field,
                    categories.into_iter().map(str::to_string).collect(),
                )
            })
            .collect();
        CategoryVocabulary { fields }
    }
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new(vec![CategoricalField::Lang, CategoricalField::Country])
    }
}

/// Fitted categories, per field, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    fields: Vec<(CategoricalField, Vec<String>)>,
}

impl CategoryVocabulary {
    pub fn categories(&self, field: CategoricalField) -> &[String] {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, c)| c.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of indicator columns this vocabulary produces.
    pub fn width(&self) -> usize {
        self.fields.iter().map(|(_, c)| c.len()).sum()
    }

    /// Indicator column names in the order [`transform`](Transformer::transform)
    /// pushes them: fields as given to the encoder, categories sorted.
    pub fn column_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|(field, categories)| {
                categories.iter().map(move |c| category_column(*field, c))
            })
            .collect()
    }
}

fn category_column(field: CategoricalField, category: &str) -> String {
    format!("{}_{}", field.prefix(), category)
}

impl Transformer for CategoryVocabulary {
    fn name(&self) -> &str {
        "OneHotEncoder"
    }

    fn transform(&self, mut frame: FeatureFrame) -> Result<FeatureFrame> {
        let n_rows = frame.len();
        for (field, categories) in &self.fields {
            let position: HashMap<&str, usize> = categories
                .iter()
                .enumerate()
                .map(|(i, c)| (c.as_str(), i))
                .collect();

            let mut columns = vec![vec![0.0; n_rows]; categories.len()];
            for (row, movie) in frame.records().iter().enumerate() {
                if let Some(&i) = position.get(field.value(movie)) {
                    columns[i][row] = 1.0;
                }
            }

            for (category, values) in categories.iter().zip(columns) {
                frame.push_column(category_column(*field, category), values)?;
            }
        }
        Ok(frame)
    }
}
