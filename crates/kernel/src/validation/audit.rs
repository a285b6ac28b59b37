use std::fmt;

use tracing::{debug, instrument};

use crate::geometry::point::Point3d;
use crate::topology::face::Face;
use crate::topology::weld::EdgeIndex;

/// One manifold defect found by [`ManifoldAudit`].
#[derive(Debug, Clone, PartialEq)]
pub enum AuditFinding {
    /// `V - E + F` differs from 2.
    EulerViolation {
        vertices: usize,
        edges: usize,
        faces: usize,
        characteristic: i64,
    },
    /// An undirected edge used by a number of faces other than two.
    EdgeUseCount { start: Point3d, end: Point3d, uses: usize },
    /// Two faces traverse a shared edge in the same direction.
    SameDirectionPair { start: Point3d, end: Point3d },
    /// The shell encloses negative volume: normals point inward.
    NegativeVolume { volume: f64 },
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EulerViolation {
                vertices,
                edges,
                faces,
                characteristic,
            } => write!(
                f,
                "Euler characteristic {characteristic} (V={vertices} E={edges} F={faces}), expected 2"
            ),
            Self::EdgeUseCount { start, end, uses } => {
                write!(f, "edge {start:?} -> {end:?} used by {uses} faces")
            }
            Self::SameDirectionPair { start, end } => {
                write!(f, "edge {start:?} -> {end:?} traversed the same way by both faces")
            }
            Self::NegativeVolume { volume } => write!(f, "enclosed volume {volume:.6e} is negative"),
        }
    }
}

/// Topological audit of a face list as a closed genus-0 shell.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifoldAudit {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub face_count: usize,
    pub euler_characteristic: i64,
    pub signed_volume: f64,
    pub findings: Vec<AuditFinding>,
}

impl ManifoldAudit {
    #[instrument(level = "debug", skip(faces), fields(faces = faces.len()))]
    pub fn of_faces(faces: &[Face]) -> Self {
        let index = EdgeIndex::build(faces);
        let vertex_count = index.vertex_count();
        let edge_count = index.edge_count();
        let face_count = faces.len();
        let euler_characteristic = vertex_count as i64 - edge_count as i64 + face_count as i64;
        let signed_volume: f64 = faces.iter().map(Face::signed_volume).sum();

        let mut findings = Vec::new();
        if euler_characteristic != 2 {
            findings.push(AuditFinding::EulerViolation {
                vertices: vertex_count,
                edges: edge_count,
                faces: face_count,
                characteristic: euler_characteristic,
            });
        }
        for (edge, uses) in &index.uses {
            let (start, end) = index.segment(*edge).unwrap_or_default();
            if uses.len() != 2 {
                findings.push(AuditFinding::EdgeUseCount {
                    start,
                    end,
                    uses: uses.len(),
                });
            } else if uses[0].directed == uses[1].directed {
                findings.push(AuditFinding::SameDirectionPair { start, end });
            }
        }
        if signed_volume < 0.0 {
            findings.push(AuditFinding::NegativeVolume {
                volume: signed_volume,
            });
        }

        debug!(
            vertices = vertex_count,
            edges = edge_count,
            faces = face_count,
            euler = euler_characteristic,
            finding_count = findings.len(),
            "manifold audit complete"
        );

        Self {
            vertex_count,
            edge_count,
            face_count,
            euler_characteristic,
            signed_volume,
            findings,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn edges_with_bad_use_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| matches!(f, AuditFinding::EdgeUseCount { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetra_faces() -> Vec<Face> {
        let a = Point3d::new(0.0, 0.0, 0.0);
        let b = Point3d::new(1.0, 0.0, 0.0);
        let c = Point3d::new(0.0, 1.0, 0.0);
        let d = Point3d::new(0.0, 0.0, 1.0);
        vec![
            Face::new(vec![a, c, b]).unwrap(),
            Face::new(vec![a, b, d]).unwrap(),
            Face::new(vec![b, c, d]).unwrap(),
            Face::new(vec![c, a, d]).unwrap(),
        ]
    }

    #[test]
    fn test_tetrahedron_is_valid() {
        let audit = ManifoldAudit::of_faces(&tetra_faces());
        assert!(audit.is_valid(), "findings: {:?}", audit.findings);
        assert_eq!(audit.vertex_count, 4);
        assert_eq!(audit.edge_count, 6);
        assert_eq!(audit.face_count, 4);
        assert_eq!(audit.euler_characteristic, 2);
        assert!((audit.signed_volume - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_face_detected() {
        let faces = tetra_faces()[..3].to_vec();
        let audit = ManifoldAudit::of_faces(&faces);
        assert!(!audit.is_valid());
        assert_eq!(audit.edges_with_bad_use_count(), 3);
        assert!(audit
            .findings
            .iter()
            .any(|f| matches!(f, AuditFinding::EulerViolation { characteristic: 1, .. })));
    }

    #[test]
    fn test_flipped_face_detected() {
        let mut faces = tetra_faces();
        faces[2] = faces[2].reversed();
        let audit = ManifoldAudit::of_faces(&faces);
        let same_direction = audit
            .findings
            .iter()
            .filter(|f| matches!(f, AuditFinding::SameDirectionPair { .. }))
            .count();
        assert_eq!(same_direction, 3);
    }

    #[test]
    fn test_inside_out_detected() {
        let faces: Vec<Face> = tetra_faces().iter().map(Face::reversed).collect();
        let audit = ManifoldAudit::of_faces(&faces);
        assert_eq!(
            audit.findings.len(),
            1,
            "only the volume check should fire: {:?}",
            audit.findings
        );
        assert!(matches!(audit.findings[0], AuditFinding::NegativeVolume { .. }));
        assert!(audit.findings[0].to_string().contains("negative"));
    }
}
