//! Profiling summary persistence
//!
//! One `SummaryRow` per source column, written to a single fixed-path CSV
//! file that is overwritten on every run and read back once by the push
//! step. The serialized header is `column_name,unique_values,data_types,
//! missing_values`, which is also the field order the relational store
//! expects.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SUMMARY_FILE_NAME: &str = "preprocess_results.csv";

/// Per-column statistics record. `column_name` is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub column_name: String,
    pub unique_values: u64,
    pub data_types: String,
    pub missing_values: u64,
}

/// Write the summary rows to `path`, replacing any previous contents.
pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the summary rows back from `path`.
pub fn read_summary(path: &Path) -> Result<Vec<SummaryRow>> {
    if !path.exists() {
        return Err(PipelineError::NotFound(format!(
            "summary file {} does not exist - run preprocess first",
            path.display()
        )));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_header_and_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(SUMMARY_FILE_NAME);

        let rows = vec![
            SummaryRow {
                column_name: "InvoiceDate".to_string(),
                unique_values: 3,
                data_types: "datetime".to_string(),
                missing_values: 0,
            },
            SummaryRow {
                column_name: "Qty".to_string(),
                unique_values: 2,
                data_types: "int".to_string(),
                missing_values: 1,
            },
        ];
        write_summary(&path, &rows).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "column_name,unique_values,data_types,missing_values"
        );
        assert_eq!(lines.next().unwrap(), "InvoiceDate,3,datetime,0");

        // A rerun replaces the file instead of appending
        write_summary(&path, &rows[..1]).unwrap();
        let reread = read_summary(&path).unwrap();
        assert_eq!(reread.len(), 1);
        assert_eq!(reread[0].column_name, "InvoiceDate");
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_summary(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }
}
