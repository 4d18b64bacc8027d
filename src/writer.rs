//! Partition file output
//!
//! Serializes each time bucket to a CSV file under
//! `<output_root>/grouped_csv_files/<year>/dataincsv1_<YYYY-MM>.csv`,
//! creating directories as needed and overwriting files from earlier runs.
//! A bucket that fails to write is logged and skipped so one bad bucket
//! cannot abort the whole partition pass.

use crate::error::{PipelineError, Result};
use crate::temporal::TimeBucket;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const GROUPED_DIR: &str = "grouped_csv_files";

pub struct PartitionWriter {
    output_root: PathBuf,
}

impl PartitionWriter {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// Write every bucket, best-effort. Returns the paths written, in
    /// bucket order; failed buckets are absent from the list.
    pub fn write_buckets(&self, buckets: &[TimeBucket]) -> Vec<PathBuf> {
        let mut saved = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            match self.write_bucket(bucket) {
                Ok(path) => saved.push(path),
                Err(e) => warn!("skipping partition {}: {}", bucket.label, e),
            }
        }
        saved
    }

    fn write_bucket(&self, bucket: &TimeBucket) -> Result<PathBuf> {
        let dir = self
            .output_root
            .join(GROUPED_DIR)
            .join(bucket.year.to_string());
        fs::create_dir_all(&dir).map_err(|e| {
            PipelineError::PartitionWrite(format!("failed to create {}: {}", dir.display(), e))
        })?;

        let path = dir.join(format!("dataincsv1_{}.csv", bucket.label));
        write_frame(&path, &bucket.rows)
            .map_err(|e| PipelineError::PartitionWrite(format!("{}: {}", path.display(), e)))?;
        Ok(path)
    }
}

fn write_frame(path: &Path, rows: &DataFrame) -> std::result::Result<(), PolarsError> {
    let mut file = fs::File::create(path)?;
    // CsvWriter needs a mutable frame; the clone only copies column handles
    let mut rows = rows.clone();
    CsvWriter::new(&mut file).include_header(true).finish(&mut rows)
}
