//! Cap synthesis: closing a sliced half with faces in the cutting plane.
//!
//! After classification, the faces on the normal side of the plane leave a
//! set of edges used only once. All of them lie in the plane: chords where
//! the plane crossed a face, plus edges of faces that lay in the plane and
//! were sent to the other half. Chained together they form the boundary of
//! the cross-section.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::KernelError;
use crate::geometry::plane::Plane;
use crate::topology::face::Face;
use crate::topology::weld::{EdgeIndex, VertexId};

/// Caps closing the normal-side faces, oriented with their normals against
/// the plane normal. Reverse each one to close the opposite side.
pub fn synthesize_caps(normal_faces: &[Face], plane: &Plane) -> Result<Vec<Face>, KernelError> {
    let index = EdgeIndex::build(normal_faces);

    // A cap must traverse each open edge backwards to pair with it.
    let mut next: BTreeMap<VertexId, VertexId> = BTreeMap::new();
    for uses in index.uses.values().filter(|u| u.len() == 1) {
        let (a, b) = uses[0].directed;
        let (pa, pb) = index.segment((a, b)).unwrap_or_default();
        if !plane.contains(&pa) || !plane.contains(&pb) {
            return Err(KernelError::structural(format!(
                "open edge {pa:?} -> {pb:?} is off the cutting plane"
            )));
        }
        if next.insert(b, a).is_some() {
            return Err(KernelError::degenerate(format!(
                "cross-section is pinched at {pb:?}"
            )));
        }
    }
    if let Some(uses) = index.uses.values().find(|u| u.len() > 2) {
        return Err(KernelError::structural(format!(
            "edge shared by {} faces on one side of the cut",
            uses.len()
        )));
    }

    let mut caps = Vec::new();
    while let Some((&start, _)) = next.first_key_value() {
        let mut ring = vec![start];
        let mut current = start;
        loop {
            let Some(following) = next.remove(&current) else {
                return Err(KernelError::structural("cross-section boundary does not close"));
            };
            if following == start {
                break;
            }
            ring.push(following);
            current = following;
        }
        let points = ring
            .iter()
            .filter_map(|&id| index.pool.point(id))
            .collect::<Vec<_>>();
        let cap = Face::new(points)?;
        if cap.normal().dot(&plane.normal.as_vec3()) > 0.0 {
            return Err(KernelError::degenerate(
                "cross-section has a hole; the piece around it would not be genus 0",
            ));
        }
        caps.push(cap);
    }
    debug!(caps = caps.len(), "cut caps synthesized");
    Ok(caps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::plane::PlaneSide;
    use crate::geometry::point::Point3d;
    use crate::geometry::vector::{Direction, Vec3};
    use crate::topology::primitives::make_box;

    fn upper_half(plane: &Plane) -> Vec<Face> {
        let solid = make_box(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0)).unwrap();
        solid
            .faces()
            .iter()
            .flat_map(|f| f.slice(plane).unwrap().pieces)
            .filter(|f| {
                f.vertices().iter().all(|p| plane.side_of(p) != PlaneSide::Opposite)
                    && f.vertices().iter().any(|p| plane.side_of(p) == PlaneSide::Normal)
            })
            .collect()
    }

    #[test]
    fn test_single_cap_for_box_cut() {
        let plane = Plane::horizontal(0.25);
        let faces = upper_half(&plane);
        assert_eq!(faces.len(), 5);
        let caps = synthesize_caps(&faces, &plane).unwrap();
        assert_eq!(caps.len(), 1);
        assert!(caps[0].normal().approx_eq(&Direction::Z.reversed(), 1e-12));
        assert!((caps[0].area() - 1.0).abs() < 1e-12);
        assert!(caps[0].vertices().iter().all(|p| plane.contains(p)));
    }

    #[test]
    fn test_open_edge_off_plane_is_structural() {
        let plane = Plane::horizontal(0.25);
        let mut faces = upper_half(&plane);
        faces.retain(|f| !f.normal().approx_eq(&Direction::Z, 1e-12));
        assert!(matches!(
            synthesize_caps(&faces, &plane),
            Err(KernelError::Structural { .. })
        ));
    }

    #[test]
    fn test_cross_section_touching_itself_is_pinched() {
        // Two cubes standing on the plane, meeting only at (1, 1, 0).
        let plane = Plane::horizontal(0.0);
        let without_bottom = |min: Point3d| {
            make_box(min, min + Vec3::new(1.0, 1.0, 1.0))
                .unwrap()
                .into_faces()
                .into_iter()
                .filter(|f| !f.normal().approx_eq(&Direction::Z.reversed(), 1e-12))
        };
        let faces: Vec<Face> = without_bottom(Point3d::ORIGIN)
            .chain(without_bottom(Point3d::new(1.0, 1.0, 0.0)))
            .collect();
        assert_eq!(faces.len(), 10);
        assert!(matches!(
            synthesize_caps(&faces, &plane),
            Err(KernelError::DegenerateInput { .. })
        ));
    }
}
