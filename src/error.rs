//! Error types shared by every pipeline stage

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the extraction, checking, storage and transformation stages
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Filesystem access failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A table operation referenced a column that does not exist
    #[error("Column not found: {0}")]
    MissingColumn(String),

    /// No stored file matched the requested folder and suffix
    #[error("No file ending in '{suffix}' found in {folder}")]
    MissingInput { folder: PathBuf, suffix: String },

    /// The storage layer cannot read this file type back
    #[error("Reading {0} files is not supported")]
    UnsupportedFormat(String),

    /// A curated dataset failed its data-quality suite
    #[error("Data quality suite '{suite}' failed for {dataset}: {failed} expectation(s) unmet")]
    DataQuality {
        suite: String,
        dataset: String,
        failed: usize,
    },

    /// The database never became ready
    #[error("Database not ready after {attempts} attempt(s): {last_error}")]
    DatabaseUnavailable { attempts: u32, last_error: String },

    /// Configuration was rejected
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
