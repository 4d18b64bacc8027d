//! Summary push
//!
//! Reads the fixed-path profiling summary and upserts it into the
//! `column_anlys` table, keyed by column name. All rows go in one
//! transaction; a row-level failure rolls the whole batch back. The store
//! connection lives for exactly one push call.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::summary;
use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::info;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS column_anlys(
        column_name TEXT PRIMARY KEY,
        unique_values INTEGER,
        data_type TEXT,
        missing_count INTEGER
    )";

const UPSERT_ROW: &str = "
    INSERT INTO column_anlys(column_name, unique_values, data_type, missing_count)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(column_name) DO UPDATE SET
        unique_values = excluded.unique_values,
        data_type = excluded.data_type,
        missing_count = excluded.missing_count";

#[derive(Debug, Serialize)]
pub struct PushReport {
    pub message: String,
    pub rows_pushed: usize,
}

pub struct SummaryUpserter {
    config: PipelineConfig,
}

impl SummaryUpserter {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn push(&self) -> Result<PushReport> {
        let rows = summary::read_summary(&self.config.summary_file())?;

        let mut connection = Connection::open(&self.config.db_path).map_err(|e| {
            PipelineError::Connection(format!(
                "could not open store at {}: {}",
                self.config.db_path.display(),
                e
            ))
        })?;

        connection
            .execute(CREATE_TABLE, [])
            .map_err(|e| PipelineError::Upsert(format!("failed to ensure table: {}", e)))?;

        let tx = connection
            .transaction()
            .map_err(|e| PipelineError::Upsert(format!("failed to start transaction: {}", e)))?;
        for row in &rows {
            tx.execute(
                UPSERT_ROW,
                params![
                    row.column_name,
                    row.unique_values as i64,
                    row.data_types,
                    row.missing_values as i64
                ],
            )
            .map_err(|e| {
                PipelineError::Upsert(format!(
                    "failed to upsert column '{}': {}",
                    row.column_name, e
                ))
            })?;
        }
        tx.commit()
            .map_err(|e| PipelineError::Upsert(format!("failed to commit batch: {}", e)))?;

        info!("pushed {} summary rows to column_anlys", rows.len());
        Ok(PushReport {
            message: format!("pushed {} summary rows to column_anlys", rows.len()),
            rows_pushed: rows.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{write_summary, SummaryRow};

    fn config_in(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            output_root: dir.to_path_buf(),
            summary_dir: dir.join("preprocess_output"),
            db_path: dir.join("column_anlys.db"),
            ..PipelineConfig::default()
        }
    }

    fn seed_summary(config: &PipelineConfig, rows: &[SummaryRow]) {
        std::fs::create_dir_all(&config.summary_dir).unwrap();
        write_summary(&config.summary_file(), rows).unwrap();
    }

    #[test]
    fn test_push_without_summary_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = SummaryUpserter::new(config_in(dir.path())).push().unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[test]
    fn test_unreachable_store_is_connection_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = config_in(dir.path());
        config.db_path = dir.path().join("no/such/dir/store.db");
        seed_summary(
            &config,
            &[SummaryRow {
                column_name: "Qty".to_string(),
                unique_values: 2,
                data_types: "int".to_string(),
                missing_values: 0,
            }],
        );

        let err = SummaryUpserter::new(config.clone()).push().unwrap_err();
        assert!(matches!(err, PipelineError::Connection(_)));
        // The summary file is untouched by the failed push
        assert!(config.summary_file().exists());
    }

    #[test]
    fn test_repeated_push_overwrites_instead_of_duplicating() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = config_in(dir.path());
        seed_summary(
            &config,
            &[SummaryRow {
                column_name: "Qty".to_string(),
                unique_values: 2,
                data_types: "int".to_string(),
                missing_values: 1,
            }],
        );

        let upserter = SummaryUpserter::new(config.clone());
        upserter.push().unwrap();

        seed_summary(
            &config,
            &[SummaryRow {
                column_name: "Qty".to_string(),
                unique_values: 5,
                data_types: "int".to_string(),
                missing_values: 0,
            }],
        );
        let report = upserter.push().unwrap();
        assert_eq!(report.rows_pushed, 1);

        let connection = Connection::open(&config.db_path).unwrap();
        let (count, unique): (i64, i64) = connection
            .query_row(
                "SELECT COUNT(*), MAX(unique_values) FROM column_anlys WHERE column_name = 'Qty'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(unique, 5);
    }
}
