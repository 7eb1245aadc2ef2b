//! Job identifiers and progress records.
//!
//! A `JobProgress` is the snapshot a poller sees for one analysis job. The
//! processing pass writes it through a progress sink; pollers only read.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an analysis job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Processing stage reported to pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    /// Registered, waiting for a worker slot
    #[default]
    Queued,
    /// Worker slot acquired
    Starting,
    /// Opening the detection source
    Loading,
    /// Frame loop running
    Processing,
    /// Writing the report files
    Exporting,
    /// Finished successfully
    Complete,
    /// Finished with an error
    Error,
    /// Stopped by request
    Cancelled,
}

impl ProgressStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStage::Queued => "queued",
            ProgressStage::Starting => "starting",
            ProgressStage::Loading => "loading",
            ProgressStage::Processing => "processing",
            ProgressStage::Exporting => "exporting",
            ProgressStage::Complete => "complete",
            ProgressStage::Error => "error",
            ProgressStage::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressStage::Complete | ProgressStage::Error | ProgressStage::Cancelled
        )
    }
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One progress report: `{stage, percent, message}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: ProgressStage,
    /// Progress percentage (0-100)
    pub percent: u8,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: ProgressStage, percent: u8, message: impl Into<String>) -> Self {
        Self {
            stage,
            percent: percent.min(100),
            message: message.into(),
        }
    }
}

/// Files written for a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutputs {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub total_persons: usize,
    pub total_frames: u64,
}

/// Polled status of one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub job_id: JobId,
    pub stage: ProgressStage,
    /// Progress percentage (0-100)
    pub percent: u8,
    pub message: String,
    /// Set once the job completes
    pub outputs: Option<JobOutputs>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Sequence number for event ordering (monotonically increasing)
    pub event_seq: u64,
}

impl JobProgress {
    /// Create a queued entry.
    pub fn new(job_id: JobId) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            stage: ProgressStage::Queued,
            percent: 0,
            message: "Waiting for a worker slot".to_string(),
            outputs: None,
            started_at: now,
            updated_at: now,
            event_seq: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Apply a progress report. Ignored once the job is terminal.
    pub fn apply(&mut self, update: ProgressUpdate) {
        if self.is_terminal() {
            return;
        }
        self.stage = update.stage;
        self.percent = update.percent.min(100);
        self.message = update.message;
        self.touch();
    }

    /// Mark job as completed.
    pub fn complete(&mut self, outputs: JobOutputs) {
        if self.is_terminal() {
            return;
        }
        self.stage = ProgressStage::Complete;
        self.percent = 100;
        self.message = "Processing complete!".to_string();
        self.outputs = Some(outputs);
        self.touch();
    }

    /// Mark job as failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        self.stage = ProgressStage::Error;
        self.percent = 0;
        self.message = error.into();
        self.touch();
    }

    /// Mark job as cancelled.
    pub fn cancel(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.stage = ProgressStage::Cancelled;
        self.message = "Processing cancelled".to_string();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.event_seq += 1;
    }
}
