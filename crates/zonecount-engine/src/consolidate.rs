//! Visit consolidation: one record per distinct zone.

use indexmap::IndexMap;
use zonecount_models::{format_duration, format_timestamp, ZoneVisit};

/// Collapse repeated visits to the same zone into a single span.
///
/// The span runs from the earliest entry to the latest exit, where an open
/// visit counts as exiting at its own entry frame. Zones are kept in order of
/// first appearance. Applying this twice yields the same result.
pub fn consolidate_visits(visits: &[ZoneVisit], fps: f64) -> Vec<ZoneVisit> {
    let mut spans: IndexMap<&str, (u64, u64)> = IndexMap::new();

    for visit in visits {
        let exit = visit.exit_frame.unwrap_or(visit.entry_frame);
        spans
            .entry(visit.zone.as_str())
            .and_modify(|(first, last)| {
                *first = (*first).min(visit.entry_frame);
                *last = (*last).max(exit);
            })
            .or_insert((visit.entry_frame, exit));
    }

    spans
        .into_iter()
        .map(|(zone, (entry_frame, exit_frame))| {
            let exit_frame = exit_frame.max(entry_frame);
            ZoneVisit {
                zone: zone.to_string(),
                entry_frame,
                entry_time: format_timestamp(entry_frame, fps),
                exit_frame: Some(exit_frame),
                exit_time: Some(format_timestamp(exit_frame, fps)),
                duration: Some(format_duration((exit_frame - entry_frame) as f64 / fps)),
            }
        })
        .collect()
}
