//! Progress reporting for analysis runs.
//!
//! The analysis pass emits `{stage, percent, message}` reports without knowing
//! where they go (a job registry, a log, a terminal). Percentages follow a
//! fixed schedule:
//!
//! | Stage      | Percent  |
//! |------------|----------|
//! | starting   | 0        |
//! | loading    | 5, 10    |
//! | processing | 10..=85  |
//! | exporting  | 90       |
//! | complete   | 100      |

use std::sync::Arc;

use zonecount_models::{ProgressStage, ProgressUpdate};

/// Lowest percentage reported while frames are processed.
pub const PROCESSING_START_PERCENT: u8 = 10;

/// Span of the processing stage.
pub const PROCESSING_SPAN_PERCENT: u8 = 75;

/// Percentage reported while the report is written.
pub const EXPORTING_PERCENT: u8 = 90;

/// Receiver of progress reports.
pub trait ProgressSink: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Progress callback type.
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

impl ProgressSink for ProgressCallback {
    fn report(&self, update: ProgressUpdate) {
        (**self)(update)
    }
}

/// Sink that drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

/// Percentage for a processed frame.
///
/// Falls back to the stage start when the frame count is unknown.
pub fn processing_percent(frame: u64, total_frames: u64) -> u8 {
    if total_frames == 0 {
        return PROCESSING_START_PERCENT;
    }
    let done = frame.min(total_frames);
    PROCESSING_START_PERCENT + (done * PROCESSING_SPAN_PERCENT as u64 / total_frames) as u8
}

/// Report for a processed frame.
pub fn processing_update(frame: u64, total_frames: u64) -> ProgressUpdate {
    let message = if total_frames > 0 {
        format!("Processing frame {}/{}", frame, total_frames)
    } else {
        format!("Processing frame {}", frame)
    };
    ProgressUpdate::new(
        ProgressStage::Processing,
        processing_percent(frame, total_frames),
        message,
    )
}
