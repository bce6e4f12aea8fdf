//! Pixel-space value types

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A 2D point in pixel space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_array(arr: [f64; 2]) -> Self {
        Self {
            x: arr[0],
            y: arr[1],
        }
    }

    pub fn to_array(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).length()
    }

    pub fn midpoint(&self, other: &Self) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Perpendicular (rotated +90 degrees in image coordinates)
    pub fn perpendicular(&self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f64> for Point {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// Axis-aligned bounding box, top-left origin
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box enclosing every point. Empty input yields a zero box.
    pub fn from_points(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area of the overlap with another box, zero when disjoint or touching
    pub fn intersection_area(&self, other: &Self) -> f64 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x1 >= x2 || y1 >= y2 {
            return 0.0;
        }
        (x2 - x1) * (y2 - y1)
    }
}

/// Image dimensions in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width_f(&self) -> f64 {
        self.width as f64
    }

    pub fn height_f(&self) -> f64 {
        self.height as f64
    }

    pub fn center(&self) -> Point {
        Point::new(self.width_f() / 2.0, self.height_f() / 2.0)
    }

    /// Clamp a point into `[0, width-1] x [0, height-1]`
    pub fn clamp(&self, p: Point) -> Point {
        self.clamp_with_margin(p, 0.0)
    }

    /// Clamp a point so it stays `margin` pixels inside every edge.
    ///
    /// If the image is narrower than twice the margin the point is pinned to
    /// the image center on that axis.
    pub fn clamp_with_margin(&self, p: Point, margin: f64) -> Point {
        let max_x = (self.width_f() - 1.0 - margin).max(0.0);
        let max_y = (self.height_f() - 1.0 - margin).max(0.0);
        let x = if margin > max_x {
            self.width_f() / 2.0
        } else {
            p.x.clamp(margin, max_x)
        };
        let y = if margin > max_y {
            self.height_f() / 2.0
        } else {
            p.y.clamp(margin, max_y)
        };
        Point::new(x, y)
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width_f() - 1.0 && p.y <= self.height_f() - 1.0
    }

    /// Distance from a point to the nearest image edge
    pub fn distance_to_edge(&self, p: &Point) -> f64 {
        let right = self.width_f() - 1.0 - p.x;
        let bottom = self.height_f() - 1.0 - p.y;
        p.x.min(p.y).min(right).min(bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_operations() {
        let p1 = Point::new(1.0, 2.0);
        let p2 = Point::new(4.0, 6.0);

        assert_eq!(p1 + p2, Point::new(5.0, 8.0));
        assert_eq!(p2 - p1, Point::new(3.0, 4.0));
        assert_eq!(p1 * 2.0, Point::new(2.0, 4.0));
        assert!((p1.distance(&p2) - 5.0).abs() < 1e-12);
        assert_eq!(p1.midpoint(&p2), Point::new(2.5, 4.0));
    }

    #[test]
    fn test_normalized_zero_vector() {
        assert_eq!(Point::ZERO.normalized(), Point::ZERO);
        let n = Point::new(3.0, 4.0).normalized();
        assert!((n.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bbox_from_points() {
        let bbox = BoundingBox::from_points(&[
            Point::new(10.0, 20.0),
            Point::new(30.0, 5.0),
            Point::new(15.0, 40.0),
        ]);
        assert_eq!(bbox, BoundingBox::new(10.0, 5.0, 20.0, 35.0));
        assert_eq!(bbox.center(), Point::new(20.0, 22.5));
        assert_eq!(BoundingBox::from_points(&[]), BoundingBox::default());
    }

    #[test]
    fn test_bbox_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(2.0, 2.0, 6.0, 6.0);
        let c = BoundingBox::new(10.0, 0.0, 5.0, 5.0);
        assert_eq!(a.intersection_area(&b), 36.0);
        assert_eq!(a.intersection_area(&c), 0.0);
    }

    #[test]
    fn test_image_clamp() {
        let size = ImageSize::new(100, 50);
        assert_eq!(size.clamp(Point::new(-5.0, 60.0)), Point::new(0.0, 49.0));
        assert_eq!(
            size.clamp_with_margin(Point::new(0.0, 0.0), 10.0),
            Point::new(10.0, 10.0)
        );
        assert!(size.contains(&Point::new(99.0, 49.0)));
        assert!(!size.contains(&Point::new(100.0, 10.0)));
    }

    #[test]
    fn test_clamp_margin_wider_than_image() {
        let size = ImageSize::new(12, 12);
        let p = size.clamp_with_margin(Point::new(0.0, 11.0), 10.0);
        assert_eq!(p, Point::new(6.0, 6.0));
    }

    #[test]
    fn test_distance_to_edge() {
        let size = ImageSize::new(101, 101);
        assert_eq!(size.distance_to_edge(&Point::new(50.0, 3.0)), 3.0);
        assert_eq!(size.distance_to_edge(&Point::new(97.0, 50.0)), 3.0);
    }
}
