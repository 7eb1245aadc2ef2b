//! Per-frame person detections supplied by the external tracker.

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, Point};

/// Identifier assigned by the external tracker.
///
/// Stable for the lifetime of a physical track within one video and never
/// reused for a different track within that run.
pub type TrackId = u64;

/// One tracked person in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub track_id: TrackId,
    #[serde(rename = "bbox")]
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub confidence: f64,
}

impl Detection {
    pub fn new(track_id: TrackId, bounding_box: BoundingBox, confidence: f64) -> Self {
        Self {
            track_id,
            bounding_box,
            confidence,
        }
    }

    /// Detection whose box is centred on `center` with the given size.
    pub fn centered(track_id: TrackId, center: Point, width: f64, height: f64) -> Self {
        Self::new(
            track_id,
            BoundingBox::new(
                center.x - width / 2.0,
                center.y - height / 2.0,
                center.x + width / 2.0,
                center.y + height / 2.0,
            ),
            1.0,
        )
    }

    #[inline]
    pub fn centroid(&self) -> Point {
        self.bounding_box.centroid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_detection_round_trips_center() {
        let det = Detection::centered(7, Point::new(320.0, 240.0), 40.0, 120.0);
        assert_eq!(det.centroid(), Point::new(320.0, 240.0));
        assert_eq!(det.bounding_box.height(), 120.0);
    }

    #[test]
    fn test_detection_json_shape() {
        let json = r#"{"track_id": 3, "bbox": {"x1": 0, "y1": 0, "x2": 10, "y2": 20}, "confidence": 0.87}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.track_id, 3);
        assert_eq!(det.centroid(), Point::new(5.0, 10.0));
    }
}
