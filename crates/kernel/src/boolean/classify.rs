use crate::error::KernelError;
use crate::geometry::plane::{Plane, PlaneSide};
use crate::topology::face::Face;

/// Decide which half a sub-face belongs to.
///
/// Vertices on the plane are ignored. A face lying entirely in the plane goes
/// to the half it faces away from: the side opposite its outward normal. The
/// result is never [`PlaneSide::On`].
pub fn classify_face(face: &Face, plane: &Plane) -> Result<PlaneSide, KernelError> {
    let mut normal_side = None;
    let mut opposite_side = None;
    for p in face.vertices() {
        match plane.side_of(p) {
            PlaneSide::Normal => normal_side = normal_side.or(Some(*p)),
            PlaneSide::Opposite => opposite_side = opposite_side.or(Some(*p)),
            PlaneSide::On => {}
        }
    }
    match (normal_side, opposite_side) {
        (Some(normal_side), Some(opposite_side)) => Err(KernelError::StraddleViolation {
            normal_side,
            opposite_side,
        }),
        (Some(_), None) => Ok(PlaneSide::Normal),
        (None, Some(_)) => Ok(PlaneSide::Opposite),
        (None, None) => {
            if face.normal().dot(&plane.normal.as_vec3()) > 0.0 {
                Ok(PlaneSide::Opposite)
            } else {
                Ok(PlaneSide::Normal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point3d;

    fn square_at(z: f64) -> Face {
        Face::new(vec![
            Point3d::new(0.0, 0.0, z),
            Point3d::new(1.0, 0.0, z),
            Point3d::new(1.0, 1.0, z),
            Point3d::new(0.0, 1.0, z),
        ])
        .unwrap()
    }

    #[test]
    fn test_strict_sides() {
        let plane = Plane::horizontal(0.5);
        assert_eq!(classify_face(&square_at(1.0), &plane).unwrap(), PlaneSide::Normal);
        assert_eq!(classify_face(&square_at(0.0), &plane).unwrap(), PlaneSide::Opposite);
    }

    #[test]
    fn test_on_plane_vertices_are_ignored() {
        let wall = Face::new(vec![
            Point3d::new(0.0, 0.0, 0.5),
            Point3d::new(1.0, 0.0, 0.5),
            Point3d::new(1.0, 0.0, 1.0),
            Point3d::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        let plane = Plane::horizontal(0.5);
        assert_eq!(classify_face(&wall, &plane).unwrap(), PlaneSide::Normal);
    }

    #[test]
    fn test_coplanar_face_goes_behind_its_normal() {
        let plane = Plane::horizontal(0.0);
        let up = square_at(0.0);
        assert_eq!(classify_face(&up, &plane).unwrap(), PlaneSide::Opposite);
        assert_eq!(classify_face(&up.reversed(), &plane).unwrap(), PlaneSide::Normal);
    }

    #[test]
    fn test_straddle_is_reported() {
        let wall = Face::new(vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 1.0),
            Point3d::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        let result = classify_face(&wall, &Plane::horizontal(0.5));
        assert!(matches!(result, Err(KernelError::StraddleViolation { .. })));
    }
}
