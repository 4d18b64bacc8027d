//! Preprocess pipeline orchestration
//!
//! Linear run: load -> profile -> dedup -> summary write -> partition ->
//! payload assembly. Profiling reflects pre-dedup values; deduplication
//! keeps the first occurrence and preserves row order. Any failed step
//! aborts the run, leaving already-written partial outputs on disk.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::identifier::IdentifierFinder;
use crate::profiler::{ColumnProfiler, ColumnType};
use crate::summary;
use crate::temporal::{TemporalPartitioner, YearMonthReport};
use crate::writer::PartitionWriter;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result payload of one preprocess run.
#[derive(Debug, Serialize)]
pub struct PreprocessReport {
    /// Path of the profiling summary file.
    pub output_file: PathBuf,
    pub unique_values: BTreeMap<String, usize>,
    /// Only columns with at least one missing value.
    pub missing_values: BTreeMap<String, usize>,
    pub data_types: BTreeMap<String, ColumnType>,
    pub year_months: YearMonthReport,
    pub grouped_files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_candidates: Option<Vec<String>>,
}

pub struct PreprocessPipeline {
    config: PipelineConfig,
    profiler: ColumnProfiler,
    partitioner: TemporalPartitioner,
    writer: PartitionWriter,
}

impl PreprocessPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let partitioner = TemporalPartitioner::new(config.timestamp_column.clone());
        let writer = PartitionWriter::new(config.output_root.clone());
        Self {
            config,
            profiler: ColumnProfiler::new(),
            partitioner,
            writer,
        }
    }

    pub fn preprocess(&self, file_path: &str) -> Result<PreprocessReport> {
        info!("preprocess started");

        if file_path.trim().is_empty() {
            return Err(PipelineError::Input("file path not provided".to_string()));
        }
        let path = Path::new(file_path);
        if !path.exists() {
            return Err(PipelineError::Input(format!(
                "file {} does not exist",
                file_path
            )));
        }

        let data = load_table(path)?;
        info!("read {} rows x {} columns from {}", data.height(), data.width(), file_path);

        // Stats reflect the file as loaded, before dedup
        let profile = self.profiler.profile(&data)?;

        // Stable dedup: first occurrence wins, original row order kept
        let deduped = data
            .clone()
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;
        if deduped.height() < data.height() {
            info!("dropped {} duplicate rows", data.height() - deduped.height());
        }

        std::fs::create_dir_all(&self.config.summary_dir)?;
        let output_file = self.config.summary_file();
        summary::write_summary(&output_file, &profile.summary_rows())?;
        info!("summary written to {}", output_file.display());

        let identifier_candidates = if self.config.identifier_search.enabled {
            let finder = IdentifierFinder::new(self.config.identifier_search.max_columns);
            Some(finder.find(&deduped)?)
        } else {
            None
        };

        let partition = self.partitioner.partition(&deduped)?;
        let grouped_files = self.writer.write_buckets(&partition.buckets);
        info!(
            "partitioned into {} buckets, wrote {} files",
            partition.buckets.len(),
            grouped_files.len()
        );

        Ok(PreprocessReport {
            output_file,
            unique_values: profile.unique_values,
            missing_values: profile.missing_values,
            data_types: profile.data_types,
            year_months: partition.report,
            grouped_files,
            identifier_candidates,
        })
    }
}

fn load_table(path: &Path) -> Result<DataFrame> {
    LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()
        .map_err(|e| PipelineError::Read(format!("failed to open {}: {}", path.display(), e)))?
        .collect()
        .map_err(|e| PipelineError::Read(format!("failed to parse {}: {}", path.display(), e)))
}
