//! Pure 2D geometry — polygons, polylines and distances in pixel space.
//!
//! Everything here is deterministic and allocation-light. Polygons are
//! implicitly closed: the last vertex connects back to the first.

use crate::Point;
use std::f64::consts::PI;

/// Number of vertices used to approximate circles and ellipses.
pub const CIRCLE_SEGMENTS: usize = 16;

/// Interpolated samples per segment when smoothing a polyline.
pub const CURVE_SAMPLES_PER_SEGMENT: usize = 20;

/// Distance from `p` to the segment `a`-`b` (projection clamped to the segment).
pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let d = b - a;
    let len2 = d.dot(&d);
    if len2 == 0.0 {
        return p.distance(&a);
    }

    let t = ((p - a).dot(&d) / len2).clamp(0.0, 1.0);
    p.distance(&(a + d * t))
}

/// Minimum distance from `p` to any edge of a closed polygon.
///
/// Polygons with fewer than three vertices are treated as infinitely far away.
pub fn point_to_polygon_distance(p: Point, polygon: &[Point]) -> f64 {
    if polygon.len() < 3 {
        return f64::INFINITY;
    }

    (0..polygon.len())
        .map(|i| point_to_segment_distance(p, polygon[i], polygon[(i + 1) % polygon.len()]))
        .fold(f64::INFINITY, f64::min)
}

/// Arithmetic mean of a point set, `None` when empty.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Point::ZERO, |acc, p| acc + *p);
    Some(sum * (1.0 / points.len() as f64))
}

/// Weighted mean of `(point, weight)` pairs, `None` when the weights sum to zero.
pub fn weighted_centroid(pairs: &[(Point, f64)]) -> Option<Point> {
    let total: f64 = pairs.iter().map(|(_, w)| *w).sum();
    if pairs.is_empty() || total == 0.0 || !total.is_finite() {
        return None;
    }
    let sum = pairs.iter().fold(Point::ZERO, |acc, (p, w)| acc + *p * *w);
    Some(sum * (1.0 / total))
}

/// Regular N-gon inscribed in the circle of `radius` around `center`.
pub fn circle_polygon(center: Point, radius: f64) -> Vec<Point> {
    ellipse_polygon(center, radius * 2.0, radius * 2.0)
}

/// Polygon approximating the axis-aligned ellipse of the given full width/height.
pub fn ellipse_polygon(center: Point, width: f64, height: f64) -> Vec<Point> {
    (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / CIRCLE_SEGMENTS as f64;
            Point::new(
                center.x + (width / 2.0) * angle.cos(),
                center.y + (height / 2.0) * angle.sin(),
            )
        })
        .collect()
}

/// Push every vertex `buffer` pixels further away from the centroid.
///
/// Vertices sitting exactly on the centroid are left in place.
pub fn expand_from_centroid(polygon: &[Point], buffer: f64) -> Vec<Point> {
    let Some(c) = centroid(polygon) else {
        return Vec::new();
    };
    if polygon.len() < 3 {
        return polygon.to_vec();
    }

    polygon
        .iter()
        .map(|p| {
            let dir = (*p - c).normalized();
            *p + dir * buffer
        })
        .collect()
}

/// Piecewise-linear densification of a polyline.
///
/// Each segment contributes `samples` evenly spaced points (start inclusive),
/// followed by the final vertex.
pub fn densify_polyline(points: &[Point], samples: usize) -> Vec<Point> {
    if points.len() < 2 || samples == 0 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity((points.len() - 1) * samples + 1);
    for pair in points.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        for j in 0..samples {
            let t = j as f64 / samples as f64;
            out.push(start + (end - start) * t);
        }
    }
    if let Some(last) = points.last() {
        out.push(*last);
    }
    out
}

/// Local direction of travel at vertex `i` of a polyline.
///
/// Endpoints use their single adjacent segment; interior vertices average the
/// incoming and outgoing segment directions.
fn tangent_at(line: &[Point], i: usize) -> Point {
    let last = line.len() - 1;
    if i == 0 {
        line[1] - line[0]
    } else if i == last {
        line[last] - line[last - 1]
    } else {
        let incoming = line[i] - line[i - 1];
        let outgoing = line[i + 1] - line[i];
        (incoming + outgoing) * 0.5
    }
}

/// Constant-width ribbon around a polyline.
///
/// Walks the line forward offsetting each vertex along its left normal, then
/// backward along the right normal, giving a closed outline. Vertices with a
/// zero-length tangent (duplicates) are skipped.
pub fn buffer_polyline(line: &[Point], buffer: f64) -> Vec<Point> {
    if line.len() < 2 {
        return Vec::new();
    }

    let normals: Vec<Option<Point>> = (0..line.len())
        .map(|i| {
            let t = tangent_at(line, i);
            (t.length() > 0.0).then(|| t.normalized().perpendicular() * buffer)
        })
        .collect();

    let mut ribbon = Vec::with_capacity(line.len() * 2);
    for (p, n) in line.iter().zip(&normals) {
        if let Some(n) = n {
            ribbon.push(*p + *n);
        }
    }
    for (p, n) in line.iter().zip(&normals).rev() {
        if let Some(n) = n {
            ribbon.push(*p - *n);
        }
    }
    ribbon
}
