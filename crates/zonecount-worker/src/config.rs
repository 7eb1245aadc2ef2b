//! Worker configuration.

use std::path::PathBuf;

use zonecount_engine::{
    EngineConfig, MembershipMode, DEFAULT_FPS, DEFAULT_LINE_OFFSET, DEFAULT_OVERLAP_THRESHOLD,
};

/// Worker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Maximum concurrent analysis jobs
    pub max_concurrent_jobs: usize,
    /// Directory that receives `<name>_tracking.json` and `<name>_tracking.csv`
    pub data_dir: PathBuf,
    /// Emit a progress report every N frames
    pub progress_interval: u64,
    /// Crossing band half-width in pixels
    pub line_offset: f64,
    /// Frame rate used when a source reports none
    pub default_fps: f64,
    pub membership: MembershipMode,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            data_dir: PathBuf::from("data"),
            progress_interval: 30,
            line_offset: DEFAULT_LINE_OFFSET,
            default_fps: DEFAULT_FPS,
            membership: MembershipMode::Centroid,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let overlap_threshold = std::env::var("ZONECOUNT_OVERLAP_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_OVERLAP_THRESHOLD);
        let membership = std::env::var("ZONECOUNT_MEMBERSHIP")
            .ok()
            .and_then(|s| parse_membership(&s, overlap_threshold))
            .unwrap_or(defaults.membership);

        Self {
            max_concurrent_jobs: std::env::var("ZONECOUNT_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_concurrent_jobs),
            data_dir: std::env::var("ZONECOUNT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            progress_interval: std::env::var("ZONECOUNT_PROGRESS_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.progress_interval),
            line_offset: std::env::var("ZONECOUNT_LINE_OFFSET")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.line_offset),
            default_fps: std::env::var("ZONECOUNT_DEFAULT_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_fps),
            membership,
        }
    }

    /// Engine settings shared by every job this worker runs.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            line_offset: self.line_offset,
            progress_interval: self.progress_interval,
            membership: self.membership,
            default_fps: self.default_fps,
        }
    }
}

/// Parse `centroid` or `box_overlap` (also `overlap`).
pub fn parse_membership(value: &str, overlap_threshold: f64) -> Option<MembershipMode> {
    match value.trim().to_lowercase().as_str() {
        "centroid" => Some(MembershipMode::Centroid),
        "box_overlap" | "overlap" => Some(MembershipMode::BoxOverlap {
            min_fraction: overlap_threshold,
        }),
        _ => None,
    }
}
