//! Error types for tabinspect operations

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InspectError>;

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Unreadable file '{path}': {message}")]
    UnreadableFormat { path: PathBuf, message: String },

    #[error("Row {row} of '{path}' could not be parsed: {message}")]
    RowParse {
        path: PathBuf,
        row: usize,
        /// Field count of the raw record when the format still exposes it
        field_count: Option<usize>,
        message: String,
    },

    #[error("Malformed query: {message}")]
    MalformedQuery { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl InspectError {
    pub fn not_found(path: impl AsRef<Path>) -> Self {
        Self::NotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn unreadable(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Self::UnreadableFormat {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    pub fn row_parse(path: impl AsRef<Path>, row: usize, msg: impl Into<String>) -> Self {
        Self::RowParse {
            path: path.as_ref().to_path_buf(),
            row,
            field_count: None,
            message: msg.into(),
        }
    }

    /// Row failure for a record whose fields were split but not decoded
    pub fn row_parse_with_fields(
        path: impl AsRef<Path>,
        row: usize,
        field_count: usize,
        msg: impl Into<String>,
    ) -> Self {
        Self::RowParse {
            path: path.as_ref().to_path_buf(),
            row,
            field_count: Some(field_count),
            message: msg.into(),
        }
    }

    pub fn malformed_query(msg: impl Into<String>) -> Self {
        Self::MalformedQuery {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Only a single undecodable row may be skipped; everything else aborts the operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::RowParse { .. })
    }

    /// Row number carried by row-level errors
    pub fn row_number(&self) -> Option<usize> {
        match self {
            Self::RowParse { row, .. } => Some(*row),
            _ => None,
        }
    }

    pub fn field_count(&self) -> Option<usize> {
        match self {
            Self::RowParse { field_count, .. } => *field_count,
            _ => None,
        }
    }
}
