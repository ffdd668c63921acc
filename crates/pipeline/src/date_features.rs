//! Cyclic encoding of the release date.
//!
//! Month, day-of-month and weekday are projected onto a circle so December
//! sits next to January. Both coordinates are shifted into [0, 1].

use crate::error::Result;
use crate::frame::FeatureFrame;
use crate::traits::Transformer;
use chrono::{Datelike, NaiveDate};
use std::f64::consts::TAU;

/// Columns produced, in order.
pub const DATE_COLUMNS: [&str; 7] = [
    "year", "month_x", "month_y", "day_x", "day_y", "dow_x", "dow_y",
];

/// Stateless stage; nothing to fit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFeatures;

impl Transformer for DateFeatures {
    fn name(&self) -> &str {
        "DateFeatures"
    }

    fn transform(&self, mut frame: FeatureFrame) -> Result<FeatureFrame> {
        let mut columns: [Vec<f64>; 7] = Default::default();
        for record in frame.records() {
            for (column, value) in columns.iter_mut().zip(date_row(record.date)) {
                column.push(value);
            }
        }

        for (name, values) in DATE_COLUMNS.iter().zip(columns) {
            frame.push_column(*name, values)?;
        }
        Ok(frame)
    }
}

/// The seven date features of one release date, in [`DATE_COLUMNS`] order.
pub fn date_row(date: NaiveDate) -> [f64; 7] {
    let (month_x, month_y) = cyclic(date.month() as f64, 12.0);
    let (day_x, day_y) = cyclic(date.day() as f64, days_in_month(date) as f64);
    let (dow_x, dow_y) = cyclic(date.weekday().num_days_from_monday() as f64, 7.0);
    [
        date.year() as f64,
        month_x,
        month_y,
        day_x,
        day_y,
        dow_x,
        dow_y,
    ]
}

fn cyclic(value: f64, period: f64) -> (f64, f64) {
    let angle = TAU * value / period;
    ((angle.sin() + 1.0) / 2.0, (angle.cos() + 1.0) / 2.0)
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}
