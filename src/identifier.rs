//! Unique-identifier discovery
//!
//! Best-effort search for a natural key: first any single column that is
//! fully non-null and fully distinct, then combinations of columns of
//! increasing size whose joined value tuples are all distinct. The
//! combination search is exhaustive and therefore bounded by a configurable
//! ceiling; callers keep it disabled for wide tables.

use crate::error::Result;
use itertools::Itertools;
use polars::prelude::*;
use std::collections::HashSet;

pub struct IdentifierFinder {
    max_columns: usize,
}

impl IdentifierFinder {
    pub fn new(max_columns: usize) -> Self {
        Self { max_columns }
    }

    /// Returns single-column candidates, or the first qualifying column
    /// combination in fixed column-order, or an empty list.
    pub fn find(&self, df: &DataFrame) -> Result<Vec<String>> {
        let row_count = df.height();
        let columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

        let mut candidates = Vec::new();
        for name in &columns {
            let series = df.column(name)?;
            if series.null_count() == 0 && series.n_unique()? == row_count {
                candidates.push(name.clone());
            }
        }
        if !candidates.is_empty() {
            return Ok(candidates);
        }

        self.find_combination(df, &columns)
    }

    fn find_combination(&self, df: &DataFrame, columns: &[String]) -> Result<Vec<String>> {
        let row_count = df.height();
        let ceiling = self.max_columns.min(columns.len());
        for size in 2..=ceiling {
            for combo in columns.iter().combinations(size) {
                if combination_is_unique(df, &combo, row_count)? {
                    return Ok(combo.into_iter().cloned().collect());
                }
            }
        }
        Ok(Vec::new())
    }
}

fn combination_is_unique(df: &DataFrame, combo: &[&String], row_count: usize) -> Result<bool> {
    let series = combo
        .iter()
        .map(|name| df.column(name.as_str()))
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut seen = HashSet::with_capacity(row_count);
    for row in 0..row_count {
        let mut key = String::new();
        for (position, column) in series.iter().enumerate() {
            if position > 0 {
                key.push('_');
            }
            key.push_str(&column.get(row)?.to_string());
        }
        if !seen.insert(key) {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_unique_column_found() {
        let df = df![
            "id" => ["a", "b", "c"],
            "group" => ["x", "x", "y"]
        ]
        .unwrap();
        let found = IdentifierFinder::new(4).find(&df).unwrap();
        assert_eq!(found, vec!["id"]);
    }

    #[test]
    fn test_column_with_nulls_is_not_a_candidate() {
        let df = df![
            "id" => [Some("a"), Some("b"), None],
            "other" => ["x", "x", "y"]
        ]
        .unwrap();
        let found = IdentifierFinder::new(4).find(&df).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_composite_identifier_found_in_column_order() {
        let df = df![
            "store" => ["s1", "s1", "s2", "s2"],
            "day" => [1, 2, 1, 2],
            "note" => ["n", "n", "n", "n"]
        ]
        .unwrap();
        let found = IdentifierFinder::new(4).find(&df).unwrap();
        assert_eq!(found, vec!["store", "day"]);
    }

    #[test]
    fn test_ceiling_bounds_the_search() {
        // Every column pair repeats a tuple; only the full three-column set
        // is unique, and the ceiling of 2 stops the search before it
        let df = df![
            "a" => [1, 1, 1, 2],
            "b" => [1, 1, 2, 1],
            "c" => [1, 2, 1, 1]
        ]
        .unwrap();
        let found = IdentifierFinder::new(2).find(&df).unwrap();
        assert!(found.is_empty());

        let found = IdentifierFinder::new(3).find(&df).unwrap();
        assert_eq!(found, vec!["a", "b", "c"]);
    }
}
