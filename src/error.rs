use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Read error: {0}")]
    Read(String),

    #[error("Partition write error: {0}")]
    PartitionWrite(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Upsert error: {0}")]
    Upsert(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::Polars(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Csv(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
