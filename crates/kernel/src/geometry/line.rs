use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::{Direction, Vec3};

/// An infinite line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3d {
    pub origin: Point3d,
    pub direction: Direction,
}

impl Line3d {
    pub fn new(origin: Point3d, direction: Direction) -> Self {
        Self { origin, direction }
    }

    pub fn point_at(&self, t: f64) -> Point3d {
        self.origin + self.direction.as_vec3() * t
    }

    pub fn distance_to_point(&self, p: &Point3d) -> f64 {
        let v = *p - self.origin;
        let along = self.direction.as_vec3() * self.direction.dot(&v);
        (v - along).length()
    }
}

/// A directed line segment. Used for face edges and for chords where a
/// cutting plane crosses a face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment3d {
    pub start: Point3d,
    pub end: Point3d,
}

impl Segment3d {
    pub fn new(start: Point3d, end: Point3d) -> Self {
        Self { start, end }
    }

    pub fn vector(&self) -> Vec3 {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn midpoint(&self) -> Point3d {
        self.start.midpoint(&self.end)
    }

    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }

    /// Same endpoints in either order.
    pub fn matches(&self, other: &Segment3d, epsilon: f64) -> bool {
        self.same_direction(other, epsilon) || self.same_direction(&other.reversed(), epsilon)
    }

    /// Same endpoints in the same order.
    pub fn same_direction(&self, other: &Segment3d, epsilon: f64) -> bool {
        self.start.approx_eq(&other.start, epsilon) && self.end.approx_eq(&other.end, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_distance() {
        let line = Line3d::new(Point3d::ORIGIN, Direction::X);
        assert!((line.distance_to_point(&Point3d::new(5.0, 3.0, 4.0)) - 5.0).abs() < 1e-12);
        assert!(line.point_at(2.0).approx_eq(&Point3d::new(2.0, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn test_segment_matching() {
        let a = Segment3d::new(Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0));
        let b = a.reversed();
        assert!(a.matches(&b, 1e-9));
        assert!(!a.same_direction(&b, 1e-9));
        assert!((a.length() - 1.0).abs() < 1e-12);
    }
}
