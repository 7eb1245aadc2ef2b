//! Occupancy timelines.
//!
//! Per-frame occupant counts are folded into fixed-width windows whose width
//! and aggregation depend on the zone kind:
//!
//! | Kind     | Window | Value                                   |
//! |----------|--------|-----------------------------------------|
//! | staff    | 5 s    | `active` = 1 if any frame was occupied  |
//! | customer | 1 s    | `count` = mean occupants, one decimal   |
//!
//! Windows are emitted in order with no gaps, starting at second 0.

use zonecount_models::{format_duration, frame_to_seconds, TimelineBucket, ZoneKind};

/// Accumulator for the window currently being filled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketState {
    /// Window start in whole seconds
    pub start_seconds: u64,
    occupied: bool,
    occupant_sum: u64,
    frames: u64,
}

impl BucketState {
    pub fn new(start_seconds: u64) -> Self {
        Self {
            start_seconds,
            ..Default::default()
        }
    }

    pub fn add(&mut self, occupants: usize) {
        self.occupied |= occupants > 0;
        self.occupant_sum += occupants as u64;
        self.frames += 1;
    }

    /// Emit the finished window for a zone of the given kind.
    pub fn flush(&self, kind: ZoneKind) -> TimelineBucket {
        let time = format_duration(self.start_seconds as f64);
        match kind {
            ZoneKind::Staff => TimelineBucket::Staff {
                time,
                time_seconds: self.start_seconds,
                active: u8::from(self.occupied),
            },
            ZoneKind::Customer => TimelineBucket::Customer {
                time,
                time_seconds: self.start_seconds,
                count: round_one_decimal(self.average()),
            },
        }
    }

    /// Clear the accumulator and move it to a new window.
    pub fn reset(&mut self, start_seconds: u64) {
        *self = Self::new(start_seconds);
    }

    fn average(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.occupant_sum as f64 / self.frames as f64
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Timeline builder for one zone.
#[derive(Debug, Clone)]
pub struct TimelineAggregator {
    kind: ZoneKind,
    fps: f64,
    current: Option<BucketState>,
    buckets: Vec<TimelineBucket>,
}

impl TimelineAggregator {
    pub fn new(kind: ZoneKind, fps: f64) -> Self {
        Self {
            kind,
            fps,
            current: None,
            buckets: Vec::new(),
        }
    }

    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    /// Window start for a frame index.
    pub fn bucket_start(&self, frame: u64) -> u64 {
        let width = self.kind.bucket_width_secs();
        let seconds = frame_to_seconds(frame, self.fps).max(0.0).floor() as u64;
        seconds / width * width
    }

    /// Add one frame's occupant count.
    ///
    /// A frame that starts a new window first flushes the previous window and
    /// any empty windows in between; the frame itself counts toward the new one.
    pub fn record(&mut self, frame: u64, occupants: usize) {
        let start = self.bucket_start(frame);
        let width = self.kind.bucket_width_secs();

        match self.current.as_mut() {
            Some(state) if start > state.start_seconds => {
                self.buckets.push(state.flush(self.kind));
                let mut gap = state.start_seconds + width;
                while gap < start {
                    self.buckets.push(BucketState::new(gap).flush(self.kind));
                    gap += width;
                }
                state.reset(start);
                state.add(occupants);
            }
            Some(state) => state.add(occupants),
            None => {
                let mut gap = 0;
                while gap < start {
                    self.buckets.push(BucketState::new(gap).flush(self.kind));
                    gap += width;
                }
                let mut state = BucketState::new(start);
                state.add(occupants);
                self.current = Some(state);
            }
        }
    }

    /// Flush the open window and return the full timeline.
    pub fn finish(mut self) -> Vec<TimelineBucket> {
        if let Some(state) = self.current.take() {
            self.buckets.push(state.flush(self.kind));
        }
        self.buckets
    }

    /// Windows emitted so far, excluding the one still open.
    pub fn emitted(&self) -> &[TimelineBucket] {
        &self.buckets
    }
}
