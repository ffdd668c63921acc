//! The batch that flows through the feature stages.
//!
//! A [`FeatureFrame`] keeps the original records next to an ordered set of
//! numeric columns. Stages append columns; nothing ever removes one. Missing
//! values are stored as NaN.

use crate::error::{PipelineError, Result};
use data_loader::MovieRecord;

/// Name of the one numeric column a raw record already carries.
pub const BUDGET_COLUMN: &str = "budget";

/// A named column of `f64` values, one per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Selected numeric features: column names plus a row-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.names.len()
    }
}

/// Records plus the numeric columns derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    records: Vec<MovieRecord>,
    columns: Vec<Column>,
}

impl FeatureFrame {
    /// Start a frame from raw records; `budget` is the only numeric column.
    pub fn from_records(records: Vec<MovieRecord>) -> Self {
        let budget = records.iter().map(|m| m.budget).collect();
        Self {
            records,
            columns: vec![Column {
                name: BUDGET_COLUMN.to_string(),
                values: budget,
            }],
        }
    }

    pub fn records(&self) -> &[MovieRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a column. Re-adding an existing name replaces its values in
    /// place so repeated transforms keep the column order stable.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.records.len() {
            return Err(PipelineError::ColumnLength {
                name,
                expected: self.records.len(),
                found: values.len(),
            });
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Values of a column by name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Numeric-column selection, row-major.
    pub fn to_matrix(&self) -> FeatureMatrix {
        let names = self.columns.iter().map(|c| c.name.clone()).collect();
        let rows = (0..self.records.len())
            .map(|row| self.columns.iter().map(|c| c.values[row]).collect())
            .collect();
        FeatureMatrix { names, rows }
    }
}
