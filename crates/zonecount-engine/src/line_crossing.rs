//! One-shot line crossing detection.
//!
//! Each (person, line) pair can be counted at most once per run. After a
//! person is counted on a line, further movement around that line is
//! ignored entirely, which suppresses double counts from jitter near the
//! line at the cost of never counting a genuine return trip.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use zonecount_models::{CrossingDirection, Line, LineStats, LineTimelinePoint, Point};

use crate::geometry::{distance_to_line, side_of_line};

/// Identifier of a person as assigned by the engine.
pub type PersonId = u32;

/// Crossing state for a single counting line.
#[derive(Debug, Clone)]
pub struct LineCrossingDetector {
    name: String,
    start: Point,
    end: Point,
    /// Sign changes farther than this from the line are treated as tracker jumps
    max_distance: f64,
    last_position: HashMap<PersonId, Point>,
    counted: HashSet<PersonId>,
    in_count: u32,
    out_count: u32,
    timeline: Vec<LineTimelinePoint>,
}

impl LineCrossingDetector {
    /// Create a detector for a line already scaled to pixel space.
    pub fn new(name: impl Into<String>, start: Point, end: Point, max_distance: f64) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            max_distance,
            last_position: HashMap::new(),
            counted: HashSet::new(),
            in_count: 0,
            out_count: 0,
            timeline: Vec::new(),
        }
    }

    /// Create a detector from a normalized line and the frame resolution.
    pub fn for_line(line: &Line, width: f64, height: f64, max_distance: f64) -> Self {
        let (start, end) = line.pixel_endpoints(width, height);
        Self::new(line.name.clone(), start, end, max_distance)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Feed the latest centroid of a person and classify a crossing, if any.
    pub fn observe(&mut self, person: PersonId, centroid: Point) -> Option<CrossingDirection> {
        if self.counted.contains(&person) {
            return None;
        }

        let previous = match self.last_position.insert(person, centroid) {
            Some(previous) => previous,
            None => return None,
        };

        let old_side = side_of_line(previous, self.start, self.end);
        let new_side = side_of_line(centroid, self.start, self.end);
        if old_side * new_side >= 0.0 {
            return None;
        }

        let distance = distance_to_line(centroid, self.start, self.end);
        if distance >= self.max_distance {
            debug!(
                line = %self.name,
                person,
                distance,
                "Ignoring sign change far from line"
            );
            return None;
        }

        let direction = if old_side > 0.0 {
            self.in_count += 1;
            CrossingDirection::In
        } else {
            self.out_count += 1;
            CrossingDirection::Out
        };
        self.counted.insert(person);
        Some(direction)
    }

    /// Append the current cumulative counts to the line timeline.
    pub fn record_timeline_point(&mut self, time: String, time_seconds: f64) {
        self.timeline.push(LineTimelinePoint {
            time,
            time_seconds,
            in_count: self.in_count,
            out_count: self.out_count,
        });
    }

    /// Whether this person has already been counted on this line.
    pub fn is_counted(&self, person: PersonId) -> bool {
        self.counted.contains(&person)
    }

    pub fn in_count(&self) -> u32 {
        self.in_count
    }

    pub fn out_count(&self) -> u32 {
        self.out_count
    }

    /// Snapshot of final counts and the crossing timeline.
    pub fn stats(&self) -> LineStats {
        LineStats {
            in_count: self.in_count,
            out_count: self.out_count,
            timeline: self.timeline.clone(),
        }
    }
}
