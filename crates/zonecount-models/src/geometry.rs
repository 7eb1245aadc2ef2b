//! Geometry primitives shared by configuration and detections.

use serde::{Deserialize, Serialize};

/// A 2-D point.
///
/// Used both for normalized configuration coordinates (0.0 to 1.0) and for
/// pixel-space coordinates once scaled to the frame resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale a normalized point into pixel space.
    #[inline]
    pub fn scale(&self, width: f64, height: f64) -> Point {
        Point {
            x: self.x * width,
            y: self.y * height,
        }
    }

    /// Check that both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Bounding box in pixel coordinates, as corner pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x1: f64,
    /// Top edge y-coordinate
    pub y1: f64,
    /// Right edge x-coordinate
    pub x2: f64,
    /// Bottom edge y-coordinate
    pub y2: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its corners.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Midpoint of the box. All zone and line tests use this point.
    #[inline]
    pub fn centroid(&self) -> Point {
        Point {
            x: (self.x1 + self.x2) / 2.0,
            y: (self.y1 + self.y2) / 2.0,
        }
    }

    /// Box width in pixels.
    #[inline]
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    /// Box height in pixels.
    #[inline]
    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Corner-normalized copy (x1 <= x2, y1 <= y2).
    pub fn normalized(&self) -> BoundingBox {
        BoundingBox {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid_is_box_midpoint() {
        let bbox = BoundingBox::new(100.0, 200.0, 140.0, 300.0);
        assert_eq!(bbox.centroid(), Point::new(120.0, 250.0));
    }

    #[test]
    fn test_area_ignores_corner_order() {
        let bbox = BoundingBox::new(50.0, 50.0, 10.0, 30.0);
        assert_eq!(bbox.area(), 40.0 * 20.0);
        let n = bbox.normalized();
        assert_eq!((n.x1, n.y1, n.x2, n.y2), (10.0, 30.0, 50.0, 50.0));
    }

    #[test]
    fn test_scale_normalized_point() {
        let p = Point::new(0.5, 0.25).scale(1920.0, 1080.0);
        assert_eq!(p, Point::new(960.0, 270.0));
    }
}
