//! Per-person activity state.

use indexmap::IndexSet;
use zonecount_models::{
    format_duration, format_timestamp, CrossingDirection, LineCrossing, PersonSummary, TrackId,
    ZoneVisit,
};

use crate::consolidate::consolidate_visits;
use crate::line_crossing::PersonId;

/// Everything recorded about one tracked person during a run.
#[derive(Debug, Clone)]
pub struct PersonState {
    id: PersonId,
    track_id: TrackId,
    first_seen_frame: u64,
    last_seen_frame: u64,
    /// Zones with an open visit, in order of entry
    current_zones: IndexSet<String>,
    zone_history: Vec<ZoneVisit>,
    line_crossings: Vec<LineCrossing>,
    fps: f64,
}

impl PersonState {
    pub fn new(id: PersonId, track_id: TrackId, first_frame: u64, fps: f64) -> Self {
        Self {
            id,
            track_id,
            first_seen_frame: first_frame,
            last_seen_frame: first_frame,
            current_zones: IndexSet::new(),
            zone_history: Vec::new(),
            line_crossings: Vec::new(),
            fps,
        }
    }

    pub fn id(&self) -> PersonId {
        self.id
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    pub fn first_seen_frame(&self) -> u64 {
        self.first_seen_frame
    }

    pub fn last_seen_frame(&self) -> u64 {
        self.last_seen_frame
    }

    pub fn zone_history(&self) -> &[ZoneVisit] {
        &self.zone_history
    }

    pub fn line_crossings(&self) -> &[LineCrossing] {
        &self.line_crossings
    }

    pub fn is_in_zone(&self, zone: &str) -> bool {
        self.current_zones.contains(zone)
    }

    /// Record that the person was detected in `frame`.
    pub fn observe_frame(&mut self, frame: u64) {
        self.last_seen_frame = self.last_seen_frame.max(frame);
    }

    /// Open a visit unless one is already open for this zone.
    pub fn enter_zone(&mut self, zone: &str, frame: u64) -> bool {
        if !self.current_zones.insert(zone.to_string()) {
            return false;
        }
        self.zone_history.push(ZoneVisit {
            zone: zone.to_string(),
            entry_frame: frame,
            entry_time: format_timestamp(frame, self.fps),
            exit_frame: None,
            exit_time: None,
            duration: None,
        });
        true
    }

    /// Close the most recent open visit for this zone.
    pub fn exit_zone(&mut self, zone: &str, frame: u64) -> bool {
        if !self.current_zones.shift_remove(zone) {
            return false;
        }

        let fps = self.fps;
        if let Some(visit) = self
            .zone_history
            .iter_mut()
            .rev()
            .find(|v| v.zone == zone && v.is_open())
        {
            let exit_frame = frame.max(visit.entry_frame);
            visit.exit_frame = Some(exit_frame);
            visit.exit_time = Some(format_timestamp(exit_frame, fps));
            visit.duration = Some(format_duration(
                (exit_frame - visit.entry_frame) as f64 / fps,
            ));
        }
        true
    }

    pub fn record_crossing(&mut self, line: &str, direction: CrossingDirection, frame: u64) {
        self.line_crossings.push(LineCrossing {
            line: line.to_string(),
            direction,
            frame,
            time: format_timestamp(frame, self.fps),
        });
    }

    /// Close every open visit at the last sighting, then consolidate.
    pub fn finalize(&mut self) {
        let open: Vec<String> = self.current_zones.iter().cloned().collect();
        for zone in open {
            self.exit_zone(&zone, self.last_seen_frame);
        }
        self.zone_history = consolidate_visits(&self.zone_history, self.fps);
    }

    pub fn summary(&self) -> PersonSummary {
        PersonSummary {
            id: self.id,
            first_seen: format_timestamp(self.first_seen_frame, self.fps),
            last_seen: format_timestamp(self.last_seen_frame, self.fps),
            total_time: format_duration(
                (self.last_seen_frame - self.first_seen_frame) as f64 / self.fps,
            ),
            zone_visits: self.zone_history.clone(),
            line_crossings: self.line_crossings.clone(),
            total_zone_visits: self.zone_history.len(),
            total_line_crossings: self.line_crossings.len(),
        }
    }
}
