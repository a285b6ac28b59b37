use serde::{Deserialize, Serialize};

use super::line::Line3d;
use super::point::Point3d;
use super::vector::{Direction, Vec3};
use crate::error::KernelError;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneSide {
    /// Strictly on the side the normal points to.
    Normal,
    /// Strictly on the side opposite the normal.
    Opposite,
    /// Within the coincidence tolerance of the plane.
    On,
}

/// An infinite oriented plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3d,
    pub normal: Direction,
}

impl Plane {
    pub const XY: Self = Self::new(Point3d::ORIGIN, Direction::Z);
    pub const XZ: Self = Self::new(Point3d::ORIGIN, Direction::Y);
    pub const YZ: Self = Self::new(Point3d::ORIGIN, Direction::X);

    pub const fn new(origin: Point3d, normal: Direction) -> Self {
        Self { origin, normal }
    }

    /// Plane through `origin` with a (not necessarily unit) normal vector.
    pub fn from_normal_vector(origin: Point3d, normal: Vec3) -> Result<Self, KernelError> {
        Ok(Self::new(origin, Direction::try_from(normal)?))
    }

    /// Plane through three points; the normal follows the right-hand rule.
    pub fn from_points(a: Point3d, b: Point3d, c: Point3d) -> Result<Self, KernelError> {
        let n = (b - a).cross(&(c - a));
        Direction::new(n)
            .map(|normal| Self::new(a, normal))
            .ok_or_else(|| KernelError::degenerate("plane points are collinear"))
    }

    /// Axis-aligned plane `z = height` with the normal pointing up.
    pub fn horizontal(height: f64) -> Self {
        Self::new(Point3d::new(0.0, 0.0, height), Direction::Z)
    }

    pub fn signed_distance(&self, p: &Point3d) -> f64 {
        self.normal.dot(&(*p - self.origin))
    }

    pub fn side_of(&self, p: &Point3d) -> PlaneSide {
        self.side_of_with_tolerance(p, crate::default_tolerance().coincidence)
    }

    pub fn side_of_with_tolerance(&self, p: &Point3d, tolerance: f64) -> PlaneSide {
        let d = self.signed_distance(p);
        if d > tolerance {
            PlaneSide::Normal
        } else if d < -tolerance {
            PlaneSide::Opposite
        } else {
            PlaneSide::On
        }
    }

    pub fn contains(&self, p: &Point3d) -> bool {
        self.side_of(p) == PlaneSide::On
    }

    pub fn point_is_on_normal_side(&self, p: &Point3d) -> bool {
        self.side_of(p) == PlaneSide::Normal
    }

    pub fn project_point(&self, p: &Point3d) -> Point3d {
        *p - self.normal.as_vec3() * self.signed_distance(p)
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.origin, self.normal.reversed())
    }

    /// Orthonormal in-plane vectors `(u, v)` with `u x v` equal to the normal.
    pub fn basis(&self) -> (Vec3, Vec3) {
        let n = self.normal.as_vec3();
        let helper = if n.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
        let u = (helper - n * n.dot(&helper)).normalized().unwrap_or(Vec3::Y);
        let v = n.cross(&u);
        (u, v)
    }

    /// Same set of points and same orientation.
    pub fn approx_eq(&self, other: &Plane, epsilon: f64) -> bool {
        self.normal.approx_eq(&other.normal, epsilon) && other.signed_distance(&self.origin).abs() <= epsilon
    }

    /// Point where the segment `a`-`b` meets the plane.
    ///
    /// Endpoints are put in lexicographic order first, so `(a, b)` and
    /// `(b, a)` yield bit-identical points. An endpoint lying on the plane is
    /// returned as is; `None` when both endpoints are strictly on one side.
    pub fn intersect_segment(&self, a: &Point3d, b: &Point3d) -> Option<Point3d> {
        let (p, q) = if a.lexicographic_cmp(b).is_gt() { (b, a) } else { (a, b) };
        match (self.side_of(p), self.side_of(q)) {
            (PlaneSide::On, _) => Some(*p),
            (_, PlaneSide::On) => Some(*q),
            (sp, sq) if sp != sq => {
                let dp = self.signed_distance(p);
                let dq = self.signed_distance(q);
                Some(p.lerp(q, dp / (dp - dq)))
            }
            _ => None,
        }
    }

    /// Line of intersection with another plane; `None` when parallel.
    pub fn intersect_plane(&self, other: &Plane) -> Option<Line3d> {
        let n1 = self.normal.as_vec3();
        let n2 = other.normal.as_vec3();
        let dir = Direction::new(n1.cross(&n2))?;
        let c = n1.dot(&n2);
        let denom = 1.0 - c * c;
        if denom < crate::default_tolerance().angular {
            return None;
        }
        let d1 = n1.dot(&self.origin.to_vec3());
        let d2 = n2.dot(&other.origin.to_vec3());
        let a = (d1 - d2 * c) / denom;
        let b = (d2 - d1 * c) / denom;
        Some(Line3d::new(Point3d::ORIGIN + n1 * a + n2 * b, dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_classification() {
        let plane = Plane::horizontal(0.5);
        assert_eq!(plane.side_of(&Point3d::new(0.0, 0.0, 1.0)), PlaneSide::Normal);
        assert_eq!(plane.side_of(&Point3d::new(0.0, 0.0, 0.0)), PlaneSide::Opposite);
        assert_eq!(plane.side_of(&Point3d::new(3.0, -2.0, 0.5)), PlaneSide::On);
        assert!(plane.contains(&Point3d::new(7.0, 7.0, 0.5 + 1e-9)));
        assert!(plane.point_is_on_normal_side(&Point3d::new(0.0, 0.0, 0.6)));
    }

    #[test]
    fn test_from_points_right_hand_rule() {
        let plane = Plane::from_points(
            Point3d::ORIGIN,
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert!(plane.normal.approx_eq(&Direction::Z, 1e-12));

        let collinear = Plane::from_points(
            Point3d::ORIGIN,
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(2.0, 0.0, 0.0),
        );
        assert!(matches!(collinear, Err(KernelError::DegenerateInput { .. })));
    }

    #[test]
    fn test_intersect_segment_is_order_independent() {
        let plane = Plane::from_normal_vector(Point3d::new(0.3, 0.0, 0.0), Vec3::new(1.0, 0.2, 0.1)).unwrap();
        let a = Point3d::new(-1.0, 0.7, 0.25);
        let b = Point3d::new(2.0, -0.3, 0.9);
        let ab = plane.intersect_segment(&a, &b).unwrap();
        let ba = plane.intersect_segment(&b, &a).unwrap();
        assert_eq!(ab, ba);
        assert!(plane.contains(&ab));

        let c = Point3d::new(5.0, 0.0, 0.0);
        assert!(plane.intersect_segment(&b, &c).is_none());
    }

    #[test]
    fn test_intersect_plane() {
        let line = Plane::XY.intersect_plane(&Plane::new(Point3d::new(2.0, 0.0, 0.0), Direction::X)).unwrap();
        assert!(Plane::XY.contains(&line.origin));
        assert!((line.origin.x - 2.0).abs() < 1e-12);
        assert!(line.direction.is_perpendicular_to(&Direction::X, 1e-12));
        assert!(Plane::XY.intersect_plane(&Plane::horizontal(3.0)).is_none());
    }

    #[test]
    fn test_reference_planes() {
        assert!(Plane::XZ.contains(&Point3d::new(4.0, 0.0, -2.0)));
        assert!(Plane::YZ.contains(&Point3d::new(0.0, 4.0, -2.0)));
        assert!(Plane::XY.reversed().point_is_on_normal_side(&Point3d::new(0.0, 0.0, -1.0)));
    }
}
