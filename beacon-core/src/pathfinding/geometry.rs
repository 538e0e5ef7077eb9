//! Planar geometry used by the funnel and the navigation mesh.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point (or vector) on the navigation plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// z component of the 3D cross product.
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn approx_eq(self, other: Point, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// Twice the signed area of the triangle `a`, `b`, `c`.
///
/// Walking from `a` towards `b`, the result is positive when `c` lies to the
/// right, negative when it lies to the left and zero when the three points
/// are collinear.
pub fn triangle_area_squared(a: Point, b: Point, c: Point) -> f64 {
    let ab = b - a;
    let ac = c - a;
    ac.x * ab.y - ab.x * ac.y
}

/// The segment a path crosses between two consecutive regions.
///
/// `left` and `right` are as seen by a traveller crossing it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub left: Point,
    pub right: Point,
}

impl Portal {
    pub fn new(left: Point, right: Point) -> Self {
        Self { left, right }
    }

    /// The terminal portal, collapsed onto the destination.
    pub fn end(destination: Point) -> Self {
        Self {
            left: destination,
            right: destination,
        }
    }

    pub fn midpoint(&self) -> Point {
        (self.left + self.right) * 0.5
    }
}
