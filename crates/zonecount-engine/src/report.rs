//! Report assembly from finalized engine state.

use indexmap::IndexMap;
use tracing::debug;
use zonecount_models::{
    format_timestamp, LineStats, PersonSummary, ReportSummary, TimelineBucket, TrackingReport,
    VideoInfo, ZoneKind, ZoneReport,
};

use crate::person::PersonState;

/// Final per-zone data handed to the assembler.
#[derive(Debug, Clone)]
pub struct ZoneOutcome {
    pub name: String,
    pub kind: ZoneKind,
    pub timeline: Vec<TimelineBucket>,
    /// Occupants in the last processed frame
    pub occupants: usize,
}

/// Builds a [`TrackingReport`] once every person has been finalized.
#[derive(Debug, Clone, Copy)]
pub struct ReportAssembler {
    fps: f64,
    total_frames: u64,
}

impl ReportAssembler {
    pub fn new(fps: f64, total_frames: u64) -> Self {
        Self { fps, total_frames }
    }

    pub fn assemble(
        &self,
        zones: Vec<ZoneOutcome>,
        lines: IndexMap<String, LineStats>,
        persons: &[PersonState],
    ) -> TrackingReport {
        let mut ordered: Vec<&PersonState> = persons.iter().collect();
        ordered.sort_by_key(|p| (p.first_seen_frame(), p.id()));

        let summaries: Vec<PersonSummary> = ordered
            .into_iter()
            .filter(|p| !p.zone_history().is_empty())
            .map(PersonState::summary)
            .collect();

        let mut zone_reports = IndexMap::with_capacity(zones.len());
        let mut zone_stats = IndexMap::with_capacity(zones.len());
        for zone in zones {
            zone_stats.insert(zone.name.clone(), zone.occupants);
            zone_reports.insert(
                zone.name.clone(),
                ZoneReport {
                    kind: zone.kind,
                    name: zone.name,
                    timeline: zone.timeline,
                },
            );
        }

        debug!(
            persons_seen = persons.len(),
            persons_with_visits = summaries.len(),
            zones = zone_reports.len(),
            lines = lines.len(),
            "Assembled tracking report"
        );

        TrackingReport {
            video_info: VideoInfo {
                total_frames: self.total_frames,
                fps: self.fps,
                duration: format_timestamp(self.total_frames, self.fps),
            },
            zones: zone_reports,
            summary: ReportSummary {
                total_persons_detected: summaries.len(),
                total_persons_seen: persons.len(),
                zone_stats,
                line_stats: lines,
            },
            persons: summaries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persons_without_visits_are_counted_but_not_listed() {
        let mut visitor = PersonState::new(2, 20, 15, 30.0);
        visitor.enter_zone("queue", 15);
        visitor.observe_frame(45);
        visitor.finalize();

        let mut passerby = PersonState::new(1, 10, 1, 30.0);
        passerby.observe_frame(5);
        passerby.finalize();

        let report = ReportAssembler::new(30.0, 900).assemble(
            vec![ZoneOutcome {
                name: "queue".into(),
                kind: ZoneKind::Customer,
                timeline: vec![],
                occupants: 0,
            }],
            IndexMap::new(),
            &[visitor, passerby],
        );

        assert_eq!(report.summary.total_persons_seen, 2);
        assert_eq!(report.summary.total_persons_detected, 1);
        assert_eq!(report.persons.len(), 1);
        assert_eq!(report.persons[0].id, 2);
        assert_eq!(report.video_info.duration, "00:30");
        assert_eq!(report.summary.zone_stats["queue"], 0);
        assert_eq!(report.zones["queue"].kind, ZoneKind::Customer);
    }

    #[test]
    fn test_persons_sorted_by_first_appearance() {
        let mut late = PersonState::new(1, 1, 50, 30.0);
        late.enter_zone("a", 50);
        late.finalize();
        let mut early = PersonState::new(2, 2, 10, 30.0);
        early.enter_zone("a", 10);
        early.finalize();

        let report = ReportAssembler::new(30.0, 60).assemble(vec![], IndexMap::new(), &[late, early]);
        let ids: Vec<u32> = report.persons.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
