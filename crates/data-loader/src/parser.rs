//! Parser for the IMDB movies CSV.
//!
//! Expected header:
//! `names,date_x,score,genre,overview,crew,orig_title,status,orig_lang,budget_x,revenue,country`
//!
//! Cleaning applied to each released row:
//! - `date_x` -> `date` (`MM/DD/YYYY`, or ISO `YYYY-MM-DD`)
//! - `score` divided by [`SCORE_SCALE`]
//! - `crew` alternates actor and character names; only actors are kept
//! - `genre` has its non-breaking spaces normalised before splitting
//! - `orig_lang` keeps only the first listed language

use crate::error::{DataLoadError, Result};
use crate::types::{MovieRecord, SCORE_SCALE};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Deserialize;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

const FILE_LABEL: &str = "imdb_movies.csv";

/// Columns we read; `overview`, `orig_title` and `revenue` are ignored.
#[derive(Debug, Deserialize)]
struct RawMovieRow {
    names: String,
    date_x: String,
    score: String,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    crew: String,
    status: String,
    #[serde(default)]
    orig_lang: String,
    budget_x: String,
    #[serde(default)]
    country: String,
}

/// Parse the movies CSV, keeping only released movies.
///
/// Rows come back in file order; sorting by date is the dataset's job.
pub fn parse_movies_csv(path: &Path) -> Result<Vec<MovieRecord>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(file);
    let headers = reader.headers()?.clone();

    let mut raw_rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let raw: RawMovieRow = record.deserialize(Some(&headers))?;
        raw_rows.push((line, raw));
    }

    let total = raw_rows.len();
    let cleaned: Vec<Option<MovieRecord>> = raw_rows
        .into_par_iter()
        .map(|(line, raw)| clean_row(line, raw))
        .collect::<Result<_>>()?;
    let movies: Vec<MovieRecord> = cleaned.into_iter().flatten().collect();

    debug!(
        "Parsed {} rows from {}, {} released",
        total,
        path.display(),
        movies.len()
    );
    Ok(movies)
}

/// Turn one raw row into a record; `Ok(None)` for unreleased movies.
fn clean_row(line: usize, raw: RawMovieRow) -> Result<Option<MovieRecord>> {
    if raw.status.trim() != "Released" {
        return Ok(None);
    }

    let parse_error = |reason: String| DataLoadError::ParseError {
        file: FILE_LABEL.to_string(),
        line,
        reason,
    };

    let date = parse_release_date(&raw.date_x)
        .ok_or_else(|| parse_error(format!("Invalid date: {:?}", raw.date_x)))?;
    let score: f64 = raw
        .score
        .trim()
        .parse()
        .map_err(|e| parse_error(format!("Invalid score: {}", e)))?;
    let budget: f64 = raw
        .budget_x
        .trim()
        .parse()
        .map_err(|e| parse_error(format!("Invalid budget: {}", e)))?;
    if !budget.is_finite() || budget < 0.0 {
        return Err(DataLoadError::InvalidValue {
            field: "budget_x".to_string(),
            value: raw.budget_x,
        });
    }

    Ok(Some(MovieRecord {
        title: raw.names.trim().to_string(),
        date,
        genre: parse_genres(&raw.genre),
        cast: parse_crew(&raw.crew),
        lang: parse_language(&raw.orig_lang),
        budget,
        country: raw.country.trim().to_string(),
        score: Some(score / SCORE_SCALE),
    }))
}

/// Parse a release date in either of the formats the dataset uses.
pub(crate) fn parse_release_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

/// Extract actor names from the crew column.
///
/// Example: "Michael B. Jordan, Adonis Creed, Tessa Thompson, Bianca Taylor"
///       -> ["Michael B. Jordan", "Tessa Thompson"]
fn parse_crew(s: &str) -> Vec<String> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    s.split(", ")
        .step_by(2)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

const MISSING_VALUE: &str = "nan";

/// Split comma-separated genres. A `nan` cell or entry means no genre.
///
/// Example: "Drama,\u{a0}Action" -> ["Drama", "Action"]
fn parse_genres(s: &str) -> Vec<String> {
    s.replace('\u{a0}', " ")
        .split(", ")
        .map(str::trim)
        .filter(|g| !g.is_empty() && !g.eq_ignore_ascii_case(MISSING_VALUE))
        .map(str::to_string)
        .collect()
}

/// First listed language with spaces stripped.
///
/// Example: " English, Spanish" -> "English"
fn parse_language(s: &str) -> String {
    let compact: String = s.chars().filter(|c| *c != ' ').collect();
    compact.split(',').next().unwrap_or_default().to_string()
}
