//! Structured job logging.
//!
//! Every event carries the job ID and operation as fields. The job span from
//! [`JobLogger::create_span`] wraps the engine's own events, so those inherit
//! both fields without the engine knowing about jobs.

use std::fmt::Display;
use std::path::Path;

use tracing::{error, info, warn, Span};
use zonecount_models::{JobId, JobOutputs};

/// Operation name attached to analysis job events.
pub const ZONE_ANALYSIS: &str = "zone_analysis";

/// Job logger for the lifecycle events of one analysis job.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a new job logger for a specific job and operation.
    ///
    /// # Arguments
    /// * `job_id` - The job the events belong to
    /// * `operation` - The kind of work, e.g. [`ZONE_ANALYSIS`]
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log that the job holds a worker slot and is opening its detection log.
    pub fn log_start(&self, detections: &Path, zones: usize, lines: usize) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            detections = %detections.display(),
            zones,
            lines,
            "Job started"
        );
    }

    /// Log the end of the frame loop, before the report is written.
    pub fn log_analysis_done(&self, total_frames: u64, persons_seen: usize) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            total_frames,
            persons_seen,
            "Analysis pass done"
        );
    }

    /// Log a saved report.
    pub fn log_completion(&self, outputs: &JobOutputs, elapsed_ms: i64) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            persons = outputs.total_persons,
            total_frames = outputs.total_frames,
            json = %outputs.json.display(),
            csv = %outputs.csv.display(),
            elapsed_ms,
            "Job completed"
        );
    }

    /// Log a job stopped by cancellation or shutdown.
    pub fn log_cancelled(&self) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job cancelled, no report written"
        );
    }

    /// Log a job that ended with an error.
    pub fn log_error(&self, err: &dyn Display) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            error = %err,
            "Job failed"
        );
    }

    /// Get the job ID.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Get the operation type.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}
