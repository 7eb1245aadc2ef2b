//! Zone occupancy and line crossing analytics.
//!
//! This crate consumes a frame-ordered stream of tracked person detections
//! and produces:
//! - Per-person zone visits (consolidated to one span per zone)
//! - One-shot directional line crossings and cumulative line counts
//! - Per-zone occupancy timelines bucketed by zone kind
//! - A structured [`TrackingReport`](zonecount_models::TrackingReport) plus a
//!   CSV export
//!
//! # Usage
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use zonecount_engine::{run_analysis, EngineConfig, JsonlDetectionSource, NoopProgress};
//! use zonecount_models::AnalysisRequest;
//!
//! # fn main() -> Result<(), zonecount_engine::EngineError> {
//! let request: AnalysisRequest = serde_json::from_str(r#"{"zones": [], "lines": []}"#)?;
//! let mut source = JsonlDetectionSource::open("detections.jsonl")?;
//! let report = run_analysis(
//!     &request,
//!     &mut source,
//!     &EngineConfig::default(),
//!     &NoopProgress,
//!     &CancellationToken::new(),
//! )?;
//! println!("{} persons seen", report.summary.total_persons_seen);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod consolidate;
pub mod engine;
pub mod error;
pub mod export;
pub mod geometry;
pub mod line_crossing;
pub mod membership;
pub mod person;
pub mod progress;
pub mod report;
pub mod runner;
pub mod source;
pub mod timeline;

pub use config::{EngineConfig, MembershipMode, DEFAULT_FPS, DEFAULT_LINE_OFFSET, DEFAULT_OVERLAP_THRESHOLD};
pub use consolidate::consolidate_visits;
pub use engine::{CrossingEvent, FrameOutcome, OccupancyEngine, ZoneTransition};
pub use error::{EngineError, EngineResult};
pub use export::{to_csv, write_csv, write_json};
pub use line_crossing::{LineCrossingDetector, PersonId};
pub use membership::{MembershipDiff, ZoneMembership};
pub use person::PersonState;
pub use progress::{NoopProgress, ProgressCallback, ProgressSink};
pub use report::{ReportAssembler, ZoneOutcome};
pub use runner::run_analysis;
pub use source::{
    DetectionSource, FrameDetections, JsonlDetectionSource, SourceInfo, VecDetectionSource,
    MAX_FRAME_GAP,
};
pub use timeline::{BucketState, TimelineAggregator};
