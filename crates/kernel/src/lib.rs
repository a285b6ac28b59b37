pub mod boolean;
pub mod error;
pub mod geometry;
pub mod topology;
pub mod traits;
pub mod validation;

pub use error::KernelError;
pub use geometry::line::{Line3d, Segment3d};
pub use geometry::plane::{Plane, PlaneSide};
pub use geometry::point::Point3d;
pub use geometry::transform::{AffineTransform, Rotation};
pub use geometry::vector::{Direction, Vec3};
pub use topology::face::{Face, FaceSlice};
pub use topology::solid::Solid;
pub use traits::Shift;

/// Global tolerance configuration for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Points closer than this are considered coincident; also the
    /// point-to-plane distance below which a point lies on a plane.
    pub coincidence: f64,
    /// Dot products smaller than this count as perpendicular.
    pub angular: f64,
    /// Element-wise matrix equality and zero-pivot threshold.
    pub matrix: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-7,
            angular: 1e-9,
            matrix: solid_linalg::MATRIX_EPSILON,
        }
    }
}

impl Tolerance {
    pub fn points_coincident(&self, a: &Point3d, b: &Point3d) -> bool {
        a.distance_to(b) <= self.coincidence
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() <= self.coincidence
    }

    /// Area threshold matching `coincidence` as a length.
    pub fn is_zero_area(&self, area: f64) -> bool {
        area.abs() <= self.coincidence * self.coincidence
    }

    /// Volume threshold matching `coincidence` as a length.
    pub fn is_zero_volume(&self, volume: f64) -> bool {
        volume.abs() <= self.coincidence.powi(3)
    }
}

/// The one tolerance used by every operation without an explicit override.
pub fn default_tolerance() -> Tolerance {
    Tolerance::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_tolerance_matches_linalg() {
        assert_eq!(default_tolerance().matrix, solid_linalg::MATRIX_EPSILON);
    }

    #[test]
    fn test_points_coincident() {
        let tol = default_tolerance();
        assert!(tol.points_coincident(&Point3d::ORIGIN, &Point3d::new(0.0, 0.0, 1e-8)));
        assert!(!tol.points_coincident(&Point3d::ORIGIN, &Point3d::new(0.0, 0.0, 1e-6)));
        assert!(tol.is_zero_length(5e-8));
        assert!(tol.is_zero_volume(5e-22));
        assert!(!tol.is_zero_volume(1e-18));
    }
}
