//! Analysis job definition.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use zonecount_models::{AnalysisRequest, JobId};

/// One video to analyze.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    #[serde(default)]
    pub job_id: JobId,
    /// Base name for the output files
    pub name: String,
    pub request: AnalysisRequest,
    /// JSON-lines detection log for the video
    pub detections: PathBuf,
}

impl AnalysisJob {
    pub fn new(name: impl Into<String>, request: AnalysisRequest, detections: impl Into<PathBuf>) -> Self {
        Self {
            job_id: JobId::new(),
            name: name.into(),
            request,
            detections: detections.into(),
        }
    }

    /// Output name taken from the detection log's file stem.
    pub fn from_log(request: AnalysisRequest, detections: impl Into<PathBuf>) -> Self {
        let detections = detections.into();
        let name = detections
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        Self::new(name, request, detections)
    }
}
