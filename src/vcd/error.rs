use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or rewriting a dump.
#[derive(Debug, Error)]
pub enum VcdError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid timestamp '{text}'")]
    InvalidTimestamp { line: usize, text: String },

    #[error("line {line}: invalid variable width '{text}'")]
    InvalidWidth { line: usize, text: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type VcdResult<T> = Result<T, VcdError>;
