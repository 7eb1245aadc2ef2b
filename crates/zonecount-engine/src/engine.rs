//! The per-video analytics aggregate.
//!
//! An [`OccupancyEngine`] owns every piece of mutable state for one video:
//! zone memberships, timelines, line detectors and person records. Frames
//! must be applied strictly in order; nothing here is shared between videos.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, info};
use zonecount_models::{
    format_timestamp, frame_to_seconds, AnalysisRequest, ConfigError, CrossingDirection,
    Detection, TrackId, TrackingReport,
};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::line_crossing::{LineCrossingDetector, PersonId};
use crate::membership::ZoneMembership;
use crate::person::PersonState;
use crate::report::{ReportAssembler, ZoneOutcome};
use crate::source::SourceInfo;
use crate::timeline::TimelineAggregator;

/// A zone transition applied during one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneTransition {
    pub person: PersonId,
    pub zone: String,
    pub entered: bool,
}

/// A counted line crossing applied during one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossingEvent {
    pub person: PersonId,
    pub line: String,
    pub direction: CrossingDirection,
}

/// Everything that changed in one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    pub frame: u64,
    pub new_persons: Vec<PersonId>,
    pub transitions: Vec<ZoneTransition>,
    pub crossings: Vec<CrossingEvent>,
}

/// Zone and line occupancy state for one video.
#[derive(Debug)]
pub struct OccupancyEngine {
    config: EngineConfig,
    info: SourceInfo,
    fps: f64,
    zones: Vec<ZoneMembership>,
    timelines: Vec<TimelineAggregator>,
    /// Occupants per zone in the last processed frame
    occupants: Vec<usize>,
    lines: Vec<LineCrossingDetector>,
    /// Indexed by `person_id - 1`
    persons: Vec<PersonState>,
    track_to_person: HashMap<TrackId, PersonId>,
    frames_processed: u64,
    last_frame: u64,
}

impl OccupancyEngine {
    /// Validate the request and scale it to the source resolution.
    pub fn new(
        request: &AnalysisRequest,
        info: SourceInfo,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        request.validate()?;

        let fps = config.effective_fps(info.fps);
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ConfigError::InvalidFps(fps).into());
        }
        if info.fps != fps {
            debug!(reported = info.fps, using = fps, "Source frame rate unusable, using fallback");
        }

        let zones: Vec<ZoneMembership> = request
            .zones
            .iter()
            .map(|z| ZoneMembership::new(z, info.width, info.height))
            .collect();
        let timelines = request
            .zones
            .iter()
            .map(|z| TimelineAggregator::new(z.kind, fps))
            .collect();
        let threshold = config.crossing_threshold();
        let lines = request
            .lines
            .iter()
            .map(|l| LineCrossingDetector::for_line(l, info.width, info.height, threshold))
            .collect();

        info!(
            zones = request.zones.len(),
            lines = request.lines.len(),
            width = info.width,
            height = info.height,
            fps,
            membership = ?config.membership,
            "Occupancy engine ready"
        );

        Ok(Self {
            occupants: vec![0; zones.len()],
            zones,
            timelines,
            lines,
            config,
            info,
            fps,
            persons: Vec::new(),
            track_to_person: HashMap::new(),
            frames_processed: 0,
            last_frame: 0,
        })
    }

    /// Frame rate used for every timestamp.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn persons(&self) -> &[PersonState] {
        &self.persons
    }

    /// Person assigned to a tracker id, if it has been seen.
    pub fn person_for_track(&self, track: TrackId) -> Option<&PersonState> {
        self.track_to_person
            .get(&track)
            .and_then(|&id| self.persons.get(id as usize - 1))
    }

    /// Current occupant count of a zone.
    pub fn zone_occupants(&self, zone: &str) -> Option<usize> {
        self.zones
            .iter()
            .position(|z| z.name() == zone)
            .map(|i| self.occupants[i])
    }

    /// Apply one frame of detections.
    ///
    /// A track id appearing twice in the same frame keeps only its first box.
    pub fn process_frame(&mut self, frame: u64, detections: &[Detection]) -> FrameOutcome {
        let mut outcome = FrameOutcome {
            frame,
            ..Default::default()
        };

        let mut seen_tracks = HashSet::with_capacity(detections.len());
        let mut observed: Vec<(PersonId, &Detection)> = Vec::with_capacity(detections.len());
        for detection in detections {
            if !seen_tracks.insert(detection.track_id) {
                continue;
            }
            let (person, is_new) = self.person_id(detection.track_id, frame);
            if is_new {
                outcome.new_persons.push(person);
            }
            self.persons[person as usize - 1].observe_frame(frame);
            observed.push((person, detection));
        }

        for (i, zone) in self.zones.iter_mut().enumerate() {
            let diff = zone.evaluate(&observed, self.config.membership);
            for &person in &diff.entered {
                self.persons[person as usize - 1].enter_zone(zone.name(), frame);
                outcome.transitions.push(ZoneTransition {
                    person,
                    zone: zone.name().to_string(),
                    entered: true,
                });
            }
            for &person in &diff.exited {
                self.persons[person as usize - 1].exit_zone(zone.name(), frame);
                outcome.transitions.push(ZoneTransition {
                    person,
                    zone: zone.name().to_string(),
                    entered: false,
                });
            }
            self.timelines[i].record(frame, diff.occupants);
            self.occupants[i] = diff.occupants;
        }

        for line in &mut self.lines {
            for &(person, detection) in &observed {
                let Some(direction) = line.observe(person, detection.centroid()) else {
                    continue;
                };
                self.persons[person as usize - 1].record_crossing(line.name(), direction, frame);
                line.record_timeline_point(
                    format_timestamp(frame, self.fps),
                    frame_to_seconds(frame, self.fps),
                );
                debug!(line = line.name(), person, %direction, frame, "Line crossing");
                outcome.crossings.push(CrossingEvent {
                    person,
                    line: line.name().to_string(),
                    direction,
                });
            }
        }

        self.frames_processed += 1;
        self.last_frame = self.last_frame.max(frame);
        outcome
    }

    fn person_id(&mut self, track: TrackId, frame: u64) -> (PersonId, bool) {
        if let Some(&id) = self.track_to_person.get(&track) {
            return (id, false);
        }
        let id = self.persons.len() as PersonId + 1;
        self.persons.push(PersonState::new(id, track, frame, self.fps));
        self.track_to_person.insert(track, id);
        debug!(person = id, track, frame, "New person");
        (id, true)
    }

    /// Finalize every person and build the report.
    ///
    /// The reported frame count is the source's declared count, or the number
    /// of frames actually processed when the source did not declare one.
    pub fn finish(mut self) -> TrackingReport {
        for person in &mut self.persons {
            person.finalize();
        }

        let total_frames = if self.info.total_frames > 0 {
            self.info.total_frames
        } else {
            self.last_frame
        };

        let zones = self
            .zones
            .iter()
            .zip(self.timelines)
            .zip(self.occupants.iter())
            .map(|((zone, timeline), &occupants)| ZoneOutcome {
                name: zone.name().to_string(),
                kind: zone.kind(),
                timeline: timeline.finish(),
                occupants,
            })
            .collect();

        let lines: IndexMap<_, _> = self
            .lines
            .iter()
            .map(|l| (l.name().to_string(), l.stats()))
            .collect();

        info!(
            frames = self.frames_processed,
            persons = self.persons.len(),
            "Analysis finished"
        );

        ReportAssembler::new(self.fps, total_frames).assemble(zones, lines, &self.persons)
    }
}
