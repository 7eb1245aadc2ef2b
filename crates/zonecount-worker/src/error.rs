//! Worker error types.

use thiserror::Error;
use zonecount_engine::EngineError;
use zonecount_models::JobId;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    /// Whether the job stopped because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Engine(e) if e.is_cancelled())
    }
}
