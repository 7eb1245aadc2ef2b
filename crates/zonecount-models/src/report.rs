//! Tracking report schema.
//!
//! The report is the single structured output of an analysis run. It is
//! written as JSON and flattened into a CSV export.
//!
//! # Schema
//! ```json
//! {
//!   "video_info": {"total_frames": 900, "fps": 30.0, "duration": "00:30"},
//!   "zones": {
//!     "counter": {"type": "staff", "name": "counter",
//!                 "timeline": [{"time": "00:00", "time_seconds": 0, "active": 1}]}
//!   },
//!   "persons": [
//!     {"id": 1, "first_seen": "00:00", "last_seen": "00:12", "total_time": "00:12",
//!      "zone_visits": [{"zone": "counter", "entry_frame": 4, "entry_time": "00:00",
//!                       "exit_frame": 361, "exit_time": "00:12", "duration": "00:11"}],
//!      "line_crossings": [{"line": "door", "direction": "in", "frame": 20, "time": "00:00"}],
//!      "total_zone_visits": 1, "total_line_crossings": 1}
//!   ],
//!   "summary": {
//!     "total_persons_detected": 1, "total_persons_seen": 2,
//!     "zone_stats": {"counter": 0},
//!     "line_stats": {"door": {"in": 1, "out": 0, "timeline": []}}
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::zone::ZoneKind;

/// Sentinel written to the tabular export for a visit without exit.
pub const STILL_IN_ZONE: &str = "Still in zone";

/// Sentinel written to the tabular export for a visit without duration.
pub const NOT_AVAILABLE: &str = "N/A";

/// Header row of the tabular export.
pub const TABULAR_HEADER: [&str; 8] = [
    "Person ID",
    "First Seen",
    "Last Seen",
    "Total Time",
    "Zone",
    "Entry Time",
    "Exit Time",
    "Duration",
];

/// Complete output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingReport {
    pub video_info: VideoInfo,
    /// Per-zone metadata keyed by zone name, in configuration order
    pub zones: IndexMap<String, ZoneReport>,
    /// Persons that entered at least one zone, ordered by first appearance
    pub persons: Vec<PersonSummary>,
    pub summary: ReportSummary,
}

impl TrackingReport {
    /// Flatten into one row per (person, consolidated zone visit).
    pub fn tabular_rows(&self) -> Vec<[String; 8]> {
        self.persons
            .iter()
            .flat_map(|person| {
                person.zone_visits.iter().map(move |visit| {
                    [
                        person.id.to_string(),
                        person.first_seen.clone(),
                        person.last_seen.clone(),
                        person.total_time.clone(),
                        visit.zone.clone(),
                        visit.entry_time.clone(),
                        visit
                            .exit_time
                            .clone()
                            .unwrap_or_else(|| STILL_IN_ZONE.to_string()),
                        visit
                            .duration
                            .clone()
                            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    ]
                })
            })
            .collect()
    }
}

/// Video-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub total_frames: u64,
    pub fps: f64,
    /// Total duration as `MM:SS`
    pub duration: String,
}

/// Per-zone metadata and occupancy timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneReport {
    #[serde(rename = "type")]
    pub kind: ZoneKind,
    pub name: String,
    pub timeline: Vec<TimelineBucket>,
}

/// One fixed-width occupancy window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimelineBucket {
    /// 5-second window: 1 if anyone was present in any frame of the window
    Staff {
        time: String,
        time_seconds: u64,
        active: u8,
    },
    /// 1-second window: mean head count, rounded to one decimal
    Customer {
        time: String,
        time_seconds: u64,
        count: f64,
    },
}

impl TimelineBucket {
    /// Start of the window in whole seconds.
    pub fn start_seconds(&self) -> u64 {
        match self {
            TimelineBucket::Staff { time_seconds, .. } => *time_seconds,
            TimelineBucket::Customer { time_seconds, .. } => *time_seconds,
        }
    }
}

/// A zone visit. Open while `exit_frame` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneVisit {
    pub zone: String,
    pub entry_frame: u64,
    pub entry_time: String,
    pub exit_frame: Option<u64>,
    pub exit_time: Option<String>,
    /// `MM:SS`, set when the visit is closed
    pub duration: Option<String>,
}

impl ZoneVisit {
    pub fn is_open(&self) -> bool {
        self.exit_frame.is_none()
    }
}

/// Direction of a counting line crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingDirection {
    /// Positive half-plane to negative half-plane
    In,
    /// Negative half-plane to positive half-plane
    Out,
}

impl CrossingDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossingDirection::In => "in",
            CrossingDirection::Out => "out",
        }
    }
}

impl std::fmt::Display for CrossingDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single counted crossing by one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineCrossing {
    pub line: String,
    pub direction: CrossingDirection,
    pub frame: u64,
    pub time: String,
}

/// Per-person activity summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub id: u32,
    pub first_seen: String,
    pub last_seen: String,
    pub total_time: String,
    pub zone_visits: Vec<ZoneVisit>,
    pub line_crossings: Vec<LineCrossing>,
    pub total_zone_visits: usize,
    pub total_line_crossings: usize,
}

/// Cumulative line counts recorded at each crossing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineTimelinePoint {
    pub time: String,
    pub time_seconds: f64,
    pub in_count: u32,
    pub out_count: u32,
}

/// Final counts and crossing timeline for one line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineStats {
    #[serde(rename = "in")]
    pub in_count: u32,
    #[serde(rename = "out")]
    pub out_count: u32,
    pub timeline: Vec<LineTimelinePoint>,
}

/// Global summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Persons with at least one zone visit
    pub total_persons_detected: usize,
    /// Every person ever detected
    pub total_persons_seen: usize,
    /// Occupants of each zone in the final processed frame
    pub zone_stats: IndexMap<String, usize>,
    pub line_stats: IndexMap<String, LineStats>,
}
