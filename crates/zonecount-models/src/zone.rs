//! Zone and counting line configuration.
//!
//! Zones and lines are immutable for the duration of a run. Geometry is
//! validated once, before any frame is processed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::geometry::Point;

/// RGB display color, carried through for overlays and dashboards.
pub type Color = [u8; 3];

/// Zone semantics. Controls how occupancy is bucketed on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    /// Staff station: reported as active/inactive per 5-second window
    Staff,
    /// Customer area: reported as average head count per second
    #[default]
    Customer,
}

impl ZoneKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneKind::Staff => "staff",
            ZoneKind::Customer => "customer",
        }
    }

    /// Width of one timeline bucket in seconds.
    pub fn bucket_width_secs(&self) -> u64 {
        match self {
            ZoneKind::Staff => 5,
            ZoneKind::Customer => 1,
        }
    }
}

impl std::fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A polygonal region of interest in normalized coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Unique zone name
    pub name: String,
    /// Zone semantics
    #[serde(rename = "type", default)]
    pub kind: ZoneKind,
    /// Polygon vertices, closed implicitly (last vertex connects to first)
    #[serde(rename = "points")]
    pub polygon: Vec<Point>,
    /// Display color
    #[serde(default)]
    pub color: Color,
}

impl Zone {
    pub fn new(name: impl Into<String>, kind: ZoneKind, polygon: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            kind,
            polygon,
            color: [0, 255, 0],
        }
    }

    /// Polygon scaled to the frame resolution.
    pub fn pixel_polygon(&self, width: f64, height: f64) -> Vec<Point> {
        self.polygon.iter().map(|p| p.scale(width, height)).collect()
    }

    /// Reject polygons that cannot enclose an area.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polygon.len() < 3 {
            return Err(ConfigError::InvalidZoneGeometry {
                zone: self.name.clone(),
                reason: format!("polygon needs at least 3 points, got {}", self.polygon.len()),
            });
        }
        if self.polygon.iter().any(|p| !p.is_finite()) {
            return Err(ConfigError::InvalidZoneGeometry {
                zone: self.name.clone(),
                reason: "polygon contains a non-finite coordinate".to_string(),
            });
        }
        Ok(())
    }
}

/// A directed counting segment in normalized coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Unique line name
    pub name: String,
    pub start: Point,
    pub end: Point,
    /// Display color
    #[serde(default)]
    pub color: Color,
}

impl Line {
    pub fn new(name: impl Into<String>, start: Point, end: Point) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            color: [255, 255, 0],
        }
    }

    /// Start and end scaled to the frame resolution.
    pub fn pixel_endpoints(&self, width: f64, height: f64) -> (Point, Point) {
        (self.start.scale(width, height), self.end.scale(width, height))
    }

    /// A line whose endpoints coincide can never register a crossing.
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(ConfigError::InvalidLineGeometry {
                line: self.name.clone(),
                reason: "endpoint contains a non-finite coordinate".to_string(),
            });
        }
        if self.is_degenerate() {
            warn!(line = %self.name, "Counting line has identical endpoints and will never trigger");
        }
        Ok(())
    }
}

/// Zones and lines for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub lines: Vec<Line>,
}

impl AnalysisRequest {
    pub fn new(zones: Vec<Zone>, lines: Vec<Line>) -> Self {
        Self { zones, lines }
    }

    /// Validate every zone and line, and name uniqueness within each kind.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for zone in &self.zones {
            zone.validate()?;
            if !seen.insert(zone.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    kind: "zone",
                    name: zone.name.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for line in &self.lines {
            line.validate()?;
            if !seen.insert(line.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    kind: "line",
                    name: line.name.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Configuration rejected before processing starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid geometry for zone '{zone}': {reason}")]
    InvalidZoneGeometry { zone: String, reason: String },

    #[error("Invalid geometry for line '{line}': {reason}")]
    InvalidLineGeometry { line: String, reason: String },

    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Invalid frame rate: {0}")]
    InvalidFps(f64),
}
