// src/clean/features.rs

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

use super::date_parser::parse_date;
use super::types::NormalizedRow;

/// Calendar fields derived from a row's timestamp. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeFields {
    date: NaiveDate,
    year: i32,
    month: u32,
}

impl TimeFields {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date,
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

/// A normalized row together with its time fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Dated<R> {
    pub row: R,
    time: TimeFields,
}

impl<R> Dated<R> {
    pub fn new(row: R, time: TimeFields) -> Self {
        Self { row, time }
    }

    pub fn time(&self) -> &TimeFields {
        &self.time
    }
}

/// Attach `TimeFields` to every row whose timestamp parses; drop the rest.
/// Returns the dated rows (input order) and the number dropped.
pub fn extract_time_features<R: NormalizedRow>(
    rows: Vec<R>,
    formats: &[String],
) -> (Vec<Dated<R>>, usize) {
    let total = rows.len();
    let mut out = Vec::with_capacity(total);
    for row in rows {
        match parse_date(row.timestamp(), formats) {
            Some(date) => out.push(Dated::new(row, TimeFields::from_date(date))),
            None => debug!(timestamp = row.timestamp(), "unparsable timestamp"),
        }
    }
    let dropped = total - out.len();
    info!(kept = out.len(), dropped, "extracted time features");
    (out, dropped)
}
