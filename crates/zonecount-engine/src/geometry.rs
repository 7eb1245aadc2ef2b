//! Geometry kernel.
//!
//! Pure predicates over pixel-space points. None of these can fail; degenerate
//! input produces a well-defined answer instead.

use zonecount_models::{BoundingBox, Point};

/// Ray-casting containment test. The polygon is closed implicitly.
///
/// Points exactly on an edge may land on either side.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed side of `point` relative to the directed line `start -> end`.
///
/// Positive and negative denote the two half-planes; zero means on the line
/// (or a degenerate line).
#[inline]
pub fn side_of_line(point: Point, start: Point, end: Point) -> f64 {
    (end.x - start.x) * (point.y - start.y) - (end.y - start.y) * (point.x - start.x)
}

/// Perpendicular distance from `point` to the infinite line through
/// `start` and `end`. Zero when the line is degenerate.
pub fn distance_to_line(point: Point, start: Point, end: Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return 0.0;
    }
    side_of_line(point, start, end).abs() / len
}

/// Unsigned polygon area (shoelace formula).
pub fn polygon_area(polygon: &[Point]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let twice: f64 = polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice.abs() / 2.0
}

/// Clip a polygon against an axis-aligned box (Sutherland-Hodgman).
///
/// The box is convex, so any subject polygon clips correctly; concave input
/// may yield zero-width bridges, which contribute no area.
pub fn clip_polygon_to_rect(polygon: &[Point], rect: &BoundingBox) -> Vec<Point> {
    let rect = rect.normalized();
    let mut output: Vec<Point> = polygon.to_vec();

    for edge in [ClipEdge::Left, ClipEdge::Right, ClipEdge::Top, ClipEdge::Bottom] {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let mut prev = input[input.len() - 1];
        for &current in &input {
            let cur_in = edge.contains(current, &rect);
            let prev_in = edge.contains(prev, &rect);
            if cur_in {
                if !prev_in {
                    output.push(edge.intersect(prev, current, &rect));
                }
                output.push(current);
            } else if prev_in {
                output.push(edge.intersect(prev, current, &rect));
            }
            prev = current;
        }
    }
    output
}

#[derive(Debug, Clone, Copy)]
enum ClipEdge {
    Left,
    Right,
    Top,
    Bottom,
}

impl ClipEdge {
    fn contains(self, p: Point, rect: &BoundingBox) -> bool {
        match self {
            ClipEdge::Left => p.x >= rect.x1,
            ClipEdge::Right => p.x <= rect.x2,
            ClipEdge::Top => p.y >= rect.y1,
            ClipEdge::Bottom => p.y <= rect.y2,
        }
    }

    fn intersect(self, a: Point, b: Point, rect: &BoundingBox) -> Point {
        match self {
            ClipEdge::Left => intersect_vertical(a, b, rect.x1),
            ClipEdge::Right => intersect_vertical(a, b, rect.x2),
            ClipEdge::Top => intersect_horizontal(a, b, rect.y1),
            ClipEdge::Bottom => intersect_horizontal(a, b, rect.y2),
        }
    }
}

/// Fraction of the box area that lies inside the polygon, in [0, 1].
pub fn box_overlap_fraction(bbox: &BoundingBox, polygon: &[Point]) -> f64 {
    let area = bbox.area();
    if area <= 0.0 {
        return if point_in_polygon(bbox.centroid(), polygon) { 1.0 } else { 0.0 };
    }
    let clipped = clip_polygon_to_rect(polygon, bbox);
    (polygon_area(&clipped) / area).clamp(0.0, 1.0)
}

fn intersect_vertical(a: Point, b: Point, x: f64) -> Point {
    let t = (x - a.x) / (b.x - a.x);
    Point::new(x, a.y + t * (b.y - a.y))
}

fn intersect_horizontal(a: Point, b: Point, y: f64) -> Point {
    let t = (y - a.y) / (b.y - a.y);
    Point::new(a.x + t * (b.x - a.x), y)
}
