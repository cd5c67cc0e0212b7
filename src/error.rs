use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("File not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Invalid header row: {0}")]
    InvalidHeader(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Failure confined to one chunk. The pipeline logs it and skips the chunk.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("row {row}: malformed record: {message}")]
    Malformed { row: usize, message: String },

    #[error("row {row}, column '{column}': invalid UTF-8")]
    InvalidEncoding { row: usize, column: String },
}

/// Failure confined to one field of one row. The field is cleared.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FieldError {
    #[error("value is not text")]
    NotText,
}

pub type Result<T> = std::result::Result<T, CleanerError>;
