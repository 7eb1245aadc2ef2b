//! Engine tuning parameters.

use serde::{Deserialize, Serialize};

/// Frame rate assumed when the source reports none.
pub const DEFAULT_FPS: f64 = 30.0;

/// Default half-width of the crossing band around a counting line, in pixels.
pub const DEFAULT_LINE_OFFSET: f64 = 15.0;

/// Default minimum fraction of a box inside a zone for box-overlap membership.
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.20;

/// How a detection is judged to be inside a zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MembershipMode {
    /// Box centroid must lie inside the polygon
    #[default]
    Centroid,
    /// At least `min_fraction` of the box area must lie inside the polygon
    BoxOverlap { min_fraction: f64 },
}

/// Configuration for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Crossing band half-width in pixels; a crossing counts only when the
    /// new centroid is closer than three times this to the line
    pub line_offset: f64,
    /// Emit a progress report every N frames
    pub progress_interval: u64,
    pub membership: MembershipMode,
    /// Used when the detection source reports a frame rate of zero
    pub default_fps: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            line_offset: DEFAULT_LINE_OFFSET,
            progress_interval: 30,
            membership: MembershipMode::Centroid,
            default_fps: DEFAULT_FPS,
        }
    }
}

impl EngineConfig {
    /// Distance gate applied to a sign change.
    #[inline]
    pub fn crossing_threshold(&self) -> f64 {
        self.line_offset * 3.0
    }

    /// Resolve the frame rate to use for a source.
    pub fn effective_fps(&self, reported: f64) -> f64 {
        if reported.is_finite() && reported > 0.0 {
            reported
        } else {
            self.default_fps
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_crossing_threshold() {
        assert_eq!(EngineConfig::default().crossing_threshold(), 45.0);
    }

    #[test]
    fn test_zero_fps_falls_back() {
        let config = EngineConfig::default();
        assert_eq!(config.effective_fps(0.0), 30.0);
        assert_eq!(config.effective_fps(25.0), 25.0);
        assert_eq!(config.effective_fps(f64::NAN), 30.0);
    }
}
