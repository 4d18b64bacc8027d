//! Column profiling
//!
//! Computes per-column unique-value counts, missing-value counts and an
//! inferred logical type for a loaded frame. Pure inspection, no side
//! effects. Type inference resolves once per column from the storage dtype;
//! string columns whose values all look and parse like timestamps are
//! promoted to `datetime`.

use crate::error::Result;
use crate::summary::SummaryRow;
use crate::temporal::parse_timestamp;
use lazy_static::lazy_static;
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

lazy_static! {
    /// Cheap shape prefilter before attempting a full timestamp parse.
    static ref DATETIME_SHAPE: Regex =
        Regex::new(r"^\d{1,4}[/-]\d{1,2}[/-]\d{1,4}([ T]\d{1,2}:\d{2}(:\d{2})?)?$")
            .expect("datetime shape regex is valid");
}

/// Number of non-null values sampled when deciding the datetime promotion.
const TYPE_SAMPLE_SIZE: usize = 32;

/// Closed set of logical column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Float,
    #[serde(rename = "string")]
    Str,
    Datetime,
    Unknown,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Str => "string",
            ColumnType::Datetime => "datetime",
            ColumnType::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

/// Per-table profiling result. Column order follows the source table.
#[derive(Debug, Clone)]
pub struct TableProfile {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub unique_values: BTreeMap<String, usize>,
    /// Only columns with at least one missing value appear here.
    pub missing_values: BTreeMap<String, usize>,
    pub data_types: BTreeMap<String, ColumnType>,
}

impl TableProfile {
    /// One summary row per column in source order, with a 0 default for
    /// columns that had no missing values.
    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        self.columns
            .iter()
            .map(|name| SummaryRow {
                column_name: name.clone(),
                unique_values: self.unique_values.get(name).copied().unwrap_or(0) as u64,
                data_types: self
                    .data_types
                    .get(name)
                    .copied()
                    .unwrap_or(ColumnType::Unknown)
                    .to_string(),
                missing_values: self.missing_values.get(name).copied().unwrap_or(0) as u64,
            })
            .collect()
    }
}

pub struct ColumnProfiler;

impl ColumnProfiler {
    pub fn new() -> Self {
        Self
    }

    pub fn profile(&self, df: &DataFrame) -> Result<TableProfile> {
        let columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        let row_count = df.height();

        let mut unique_values = BTreeMap::new();
        let mut missing_values = BTreeMap::new();
        let mut data_types = BTreeMap::new();

        for name in &columns {
            let series = df.column(name)?;

            // Null is not a distinct value
            let mut unique = series.n_unique()?;
            let missing = series.null_count();
            if missing > 0 {
                unique -= 1;
                missing_values.insert(name.clone(), missing);
            }
            unique_values.insert(name.clone(), unique);
            data_types.insert(name.clone(), column_type(series)?);
        }

        Ok(TableProfile {
            columns,
            row_count,
            unique_values,
            missing_values,
            data_types,
        })
    }
}

impl Default for ColumnProfiler {
    fn default() -> Self {
        Self::new()
    }
}

fn column_type(series: &Series) -> Result<ColumnType> {
    let inferred = match series.dtype() {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => ColumnType::Int,
        DataType::Float32 | DataType::Float64 => ColumnType::Float,
        DataType::Date | DataType::Datetime(_, _) => ColumnType::Datetime,
        DataType::String => {
            if string_column_is_temporal(series)? {
                ColumnType::Datetime
            } else {
                ColumnType::Str
            }
        }
        _ => ColumnType::Unknown,
    };
    Ok(inferred)
}

/// True when every sampled non-null value matches the datetime shape and
/// parses with a known format. Empty columns stay `string`.
fn string_column_is_temporal(series: &Series) -> Result<bool> {
    let chunked = series.str()?;
    let mut sampled = 0;
    for value in chunked.into_iter().flatten().take(TYPE_SAMPLE_SIZE) {
        let value = value.trim();
        if !DATETIME_SHAPE.is_match(value) || parse_timestamp(value).is_none() {
            return Ok(false);
        }
        sampled += 1;
    }
    Ok(sampled > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_counts_and_types() {
        let df = df![
            "InvoiceDate" => ["1/5/21 08:26", "1/5/21 08:26", "2/3/21 10:15"],
            "Qty" => [Some(6), None, Some(8)],
            "Country" => ["UK", "UK", "France"]
        ]
        .unwrap();

        let profile = ColumnProfiler::new().profile(&df).unwrap();
        assert_eq!(profile.row_count, 3);
        assert_eq!(profile.unique_values["InvoiceDate"], 2);
        assert_eq!(profile.unique_values["Qty"], 2);
        assert_eq!(profile.unique_values["Country"], 2);

        // Only columns with missing values are reported
        assert_eq!(profile.missing_values.get("Qty"), Some(&1));
        assert!(!profile.missing_values.contains_key("Country"));

        assert_eq!(profile.data_types["Qty"], ColumnType::Int);
        assert_eq!(profile.data_types["Country"], ColumnType::Str);
        assert_eq!(profile.data_types["InvoiceDate"], ColumnType::Datetime);
    }

    #[test]
    fn test_missing_plus_non_null_equals_row_count() {
        let df = df![
            "a" => [Some(1.5), None, Some(2.5), None]
        ]
        .unwrap();
        let profile = ColumnProfiler::new().profile(&df).unwrap();
        let missing = profile.missing_values.get("a").copied().unwrap_or(0);
        let non_null = df.column("a").unwrap().len() - df.column("a").unwrap().null_count();
        assert_eq!(missing + non_null, profile.row_count);
        assert_eq!(profile.data_types["a"], ColumnType::Float);
    }

    #[test]
    fn test_mixed_strings_stay_string() {
        let df = df![
            "mixed" => ["1/5/21", "not a date", "2/3/21"]
        ]
        .unwrap();
        let profile = ColumnProfiler::new().profile(&df).unwrap();
        assert_eq!(profile.data_types["mixed"], ColumnType::Str);
    }

    #[test]
    fn test_summary_rows_default_missing_to_zero() {
        let df = df![
            "b" => ["x", "y"],
            "a" => [1, 2]
        ]
        .unwrap();
        let profile = ColumnProfiler::new().profile(&df).unwrap();
        let rows = profile.summary_rows();
        // Source column order is preserved
        assert_eq!(rows[0].column_name, "b");
        assert_eq!(rows[1].column_name, "a");
        assert!(rows.iter().all(|r| r.missing_values == 0));
        assert_eq!(rows[1].data_types, "int");
    }
}
