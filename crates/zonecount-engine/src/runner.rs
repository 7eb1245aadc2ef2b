//! The synchronous analysis pass.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use zonecount_models::{AnalysisRequest, ProgressStage, ProgressUpdate, TrackingReport};

use crate::config::EngineConfig;
use crate::engine::OccupancyEngine;
use crate::error::{EngineError, EngineResult};
use crate::progress::{processing_update, ProgressSink, PROCESSING_START_PERCENT};
use crate::source::DetectionSource;

/// Run one video through a fresh engine, frame by frame.
///
/// The token is checked before every frame; a cancelled run returns
/// [`EngineError::Cancelled`] and produces no report. Detector failures abort
/// the run without retry.
pub fn run_analysis<S>(
    request: &AnalysisRequest,
    source: &mut S,
    config: &EngineConfig,
    progress: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> EngineResult<TrackingReport>
where
    S: DetectionSource + ?Sized,
{
    progress.report(ProgressUpdate::new(
        ProgressStage::Loading,
        5,
        "Preparing zones and lines...",
    ));

    let info = source.info();
    let mut engine = OccupancyEngine::new(request, info, config.clone())?;

    progress.report(ProgressUpdate::new(
        ProgressStage::Loading,
        PROCESSING_START_PERCENT,
        "Processing video...",
    ));

    let interval = config.progress_interval.max(1);
    loop {
        if cancel.is_cancelled() {
            warn!(
                frames = engine.frames_processed(),
                "Analysis cancelled before completion"
            );
            return Err(EngineError::Cancelled);
        }

        let Some(frame) = source.next_frame()? else {
            break;
        };
        engine.process_frame(frame.frame, &frame.detections);

        if frame.frame % interval == 0 {
            progress.report(processing_update(frame.frame, info.total_frames));
        }
    }

    let report = engine.finish();
    info!(
        persons = report.summary.total_persons_seen,
        persons_with_visits = report.summary.total_persons_detected,
        "Analysis pass complete"
    );
    Ok(report)
}
