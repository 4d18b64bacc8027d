//! Process-wide pipeline configuration
//!
//! Output roots, the designated timestamp column, the store location and the
//! identifier-search switches all live here and are passed into the pipeline
//! constructor explicitly. Binaries load the config from a JSON file (path
//! taken from `PREPFLOW_CONFIG`, default `config.json`) and fall back to the
//! defaults when the file is absent.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Settings for the opt-in unique-identifier search.
///
/// The combination search is exponential in column count, so it is disabled
/// by default and bounded by `max_columns` when enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierSearchConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Largest combination size the search will try.
    #[serde(default = "default_max_columns")]
    pub max_columns: usize,
}

impl Default for IdentifierSearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_columns: default_max_columns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Base directory for the grouped partition files.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Directory holding the fixed-path profiling summary file.
    #[serde(default = "default_summary_dir")]
    pub summary_dir: PathBuf,

    /// Name of the designated timestamp column.
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,

    /// SQLite database file the summary rows are upserted into.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address the HTTP endpoint layer binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub identifier_search: IdentifierSearchConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            summary_dir: default_summary_dir(),
            timestamp_column: default_timestamp_column(),
            db_path: default_db_path(),
            bind_addr: default_bind_addr(),
            identifier_search: IdentifierSearchConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load from `PREPFLOW_CONFIG` (default `config.json`), falling back to
    /// defaults when the file is missing or malformed.
    pub fn from_env() -> Self {
        let path =
            std::env::var("PREPFLOW_CONFIG").unwrap_or_else(|_| "config.json".to_string());
        if Path::new(&path).exists() {
            match Self::load(&path) {
                Ok(config) => return config,
                Err(e) => warn!("failed to load config from {}: {} - using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Full path of the profiling summary file.
    pub fn summary_file(&self) -> PathBuf {
        self.summary_dir.join(crate::summary::SUMMARY_FILE_NAME)
    }
}

fn default_output_root() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_summary_dir() -> PathBuf {
    default_output_root().join("preprocess_output")
}

fn default_timestamp_column() -> String {
    "InvoiceDate".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("column_anlys.db")
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_max_columns() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.timestamp_column, "InvoiceDate");
        assert!(config.summary_file().ends_with("preprocess_output/preprocess_results.csv"));
        assert!(!config.identifier_search.enabled);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"timestamp_column": "EventTime"}"#).unwrap();
        assert_eq!(config.timestamp_column, "EventTime");
        assert_eq!(config.identifier_search.max_columns, 4);
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
    }
}
