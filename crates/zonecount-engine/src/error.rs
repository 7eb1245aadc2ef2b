//! Error types for analysis runs.

use std::path::PathBuf;
use thiserror::Error;
use zonecount_models::ConfigError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can end an analysis run.
///
/// Per-frame geometry never fails; every variant here aborts the whole run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Detector failed at frame {frame}: {message}")]
    DetectorFailure { frame: u64, message: String },

    #[error("Malformed detection log at line {line}: {message}")]
    MalformedDetections { line: usize, message: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Create a detector failure error.
    pub fn detector_failed(frame: u64, message: impl Into<String>) -> Self {
        Self::DetectorFailure {
            frame,
            message: message.into(),
        }
    }

    /// Create a malformed detection log error.
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedDetections {
            line,
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}
