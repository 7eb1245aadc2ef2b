//! Shared data models for zone and line occupancy analytics.
//!
//! This crate provides Serde-serializable types for:
//! - Geometry primitives (points, bounding boxes)
//! - Zone and counting line configuration, validated up front
//! - Per-frame detections supplied by the external tracker
//! - `MM:SS` timestamp formatting
//! - The tracking report schema and its tabular export shape
//! - Job identifiers and progress records

pub mod detection;
pub mod geometry;
pub mod job;
pub mod report;
pub mod timestamp;
pub mod zone;

// Re-export common types
pub use detection::{Detection, TrackId};
pub use geometry::{BoundingBox, Point};
pub use job::{JobId, JobOutputs, JobProgress, ProgressStage, ProgressUpdate};
pub use report::{
    CrossingDirection, LineCrossing, LineStats, LineTimelinePoint, PersonSummary, ReportSummary,
    TimelineBucket, TrackingReport, VideoInfo, ZoneReport, ZoneVisit,
};
pub use timestamp::{format_duration, format_timestamp, frame_to_seconds};
pub use zone::{AnalysisRequest, Color, ConfigError, Line, Zone, ZoneKind};
