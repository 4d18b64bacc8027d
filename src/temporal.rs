//! Temporal partitioning
//!
//! Validates the designated timestamp column, parses it, and buckets the
//! rows of a frame by calendar year-month. Values that fail to parse become
//! null and are dropped from bucket membership without raising an error.
//! A frame without the timestamp column yields an empty partition rather
//! than a failure.

use crate::error::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Formats tried in order when parsing a timestamp value. The source system
/// emits `%m/%d/%y %H:%M`, so that one goes first.
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d"];

/// Parse a single raw value as a timestamp. Date-only values resolve to
/// midnight. Returns `None` when no known format matches.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(value, format) {
            return Some(stamp);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Rows sharing the same year-month of the timestamp column.
#[derive(Debug, Clone)]
pub struct TimeBucket {
    pub year: i32,
    pub month: u32,
    /// "YYYY-MM" label, used in partition file names.
    pub label: String,
    pub rows: DataFrame,
}

/// Year/month availability across the whole table, independent of the
/// bucketing output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct YearMonthReport {
    /// Years in order of first appearance.
    pub unique_years: Vec<i32>,
    /// Sorted distinct months per year.
    pub months_available: BTreeMap<i32, Vec<u32>>,
}

#[derive(Debug, Clone, Default)]
pub struct TemporalPartition {
    /// Buckets ordered by (year, month).
    pub buckets: Vec<TimeBucket>,
    pub report: YearMonthReport,
}

pub struct TemporalPartitioner {
    column: String,
}

impl TemporalPartitioner {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    /// Bucket `df` by the year-month of the timestamp column.
    ///
    /// Grouping is stable: bucket order and row order within a bucket are
    /// the same across repeated runs on the same input.
    pub fn partition(&self, df: &DataFrame) -> Result<TemporalPartition> {
        let series = match df.column(&self.column) {
            Ok(series) => series,
            Err(_) => return Ok(TemporalPartition::default()),
        };

        let stamps = parse_series(series)?;

        let mut unique_years: Vec<i32> = Vec::new();
        let mut months: BTreeMap<i32, BTreeSet<u32>> = BTreeMap::new();
        let mut groups: BTreeMap<(i32, u32), Vec<usize>> = BTreeMap::new();
        for (row, stamp) in stamps.iter().enumerate() {
            if let Some(stamp) = stamp {
                let (year, month) = (stamp.year(), stamp.month());
                if !unique_years.contains(&year) {
                    unique_years.push(year);
                }
                months.entry(year).or_default().insert(month);
                groups.entry((year, month)).or_default().push(row);
            }
        }

        let mut buckets = Vec::with_capacity(groups.len());
        for ((year, month), rows) in groups {
            let mut mask = vec![false; df.height()];
            for row in rows {
                mask[row] = true;
            }
            let mask = BooleanChunked::from_slice("bucket", &mask);
            buckets.push(TimeBucket {
                year,
                month,
                label: format!("{}-{:02}", year, month),
                rows: df.filter(&mask)?,
            });
        }

        Ok(TemporalPartition {
            buckets,
            report: YearMonthReport {
                unique_years,
                months_available: months
                    .into_iter()
                    .map(|(year, set)| (year, set.into_iter().collect()))
                    .collect(),
            },
        })
    }
}

/// Parse every value of the column as a timestamp. Non-temporal dtypes
/// produce all-null, which downstream treats as "nothing to bucket".
fn parse_series(series: &Series) -> Result<Vec<Option<NaiveDateTime>>> {
    let as_strings = match series.dtype() {
        DataType::String => series.clone(),
        DataType::Date | DataType::Datetime(_, _) => series.cast(&DataType::String)?,
        _ => return Ok(vec![None; series.len()]),
    };
    let chunked = as_strings.str()?;
    Ok(chunked
        .into_iter()
        .map(|value| value.and_then(parse_timestamp))
        .collect())
}
