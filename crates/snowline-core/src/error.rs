// crates/snowline-core/src/error.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("recovery failed: {0}")]
    Recovery(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("checkpoint for scene '{scene}' already exists at {}", .path.display())]
    CheckpointExists { scene: String, path: PathBuf },

    #[error("extraction failed: {0}")]
    Extraction(#[from] snowline_snap::ExtractError),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
