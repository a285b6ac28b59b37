use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::face::Face;
use super::orient::repair_orientation;
use super::weld::{EdgeIndex, VertexPool};
use crate::boolean;
use crate::error::KernelError;
use crate::geometry::line::Segment3d;
use crate::geometry::plane::Plane;
use crate::geometry::point::Point3d;
use crate::geometry::transform::AffineTransform;
use crate::geometry::vector::Vec3;
use crate::traits::Shift;
use crate::validation::audit::ManifoldAudit;

/// A closed genus-0 solid bounded by planar faces.
///
/// Every constructed solid satisfies `V - E + F == 2`, every edge is shared by
/// exactly two faces traversing it in opposite directions, normals point
/// outward and the enclosed volume is non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSolid")]
pub struct Solid {
    faces: Vec<Face>,
}

#[derive(Deserialize)]
struct RawSolid {
    faces: Vec<Face>,
}

impl TryFrom<RawSolid> for Solid {
    type Error = KernelError;

    fn try_from(raw: RawSolid) -> Result<Self, Self::Error> {
        Solid::from_oriented_faces(raw.faces)
    }
}

impl Solid {
    /// Build a solid from faces in any order and orientation.
    #[instrument(level = "debug", skip(faces), fields(faces = faces.len()))]
    pub fn new(faces: Vec<Face>) -> Result<Self, KernelError> {
        let repaired = repair_orientation(&faces)?;
        Self::from_oriented_faces(repaired)
    }

    /// Build a solid from faces that are already consistently oriented.
    /// Nothing is flipped; a defect is reported as a structural error.
    pub fn from_oriented_faces(faces: Vec<Face>) -> Result<Self, KernelError> {
        if faces.len() < 4 {
            return Err(KernelError::degenerate(format!(
                "a closed solid needs at least 4 faces, got {}",
                faces.len()
            )));
        }
        let audit = ManifoldAudit::of_faces(&faces);
        if let Some(finding) = audit.findings.first() {
            return Err(KernelError::structural(finding.to_string()));
        }
        if crate::default_tolerance().is_zero_volume(audit.signed_volume) {
            return Err(KernelError::degenerate("faces enclose no volume"));
        }
        debug!(
            vertices = audit.vertex_count,
            edges = audit.edge_count,
            faces = audit.face_count,
            volume = audit.signed_volume,
            "solid constructed"
        );
        Ok(Self { faces })
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn into_faces(self) -> Vec<Face> {
        self.faces
    }

    /// Distinct vertices after welding.
    pub fn vertices(&self) -> Vec<Point3d> {
        let mut pool = VertexPool::new();
        for face in &self.faces {
            pool.weld_face(face);
        }
        pool.iter().map(|(_, p)| *p).collect()
    }

    /// Distinct undirected edges, each in the direction of its first use.
    pub fn edges(&self) -> Vec<Segment3d> {
        let index = EdgeIndex::build(&self.faces);
        index
            .uses
            .values()
            .filter_map(|uses| uses.first())
            .filter_map(|u| index.segment(u.directed))
            .map(|(a, b)| Segment3d::new(a, b))
            .collect()
    }

    pub fn euler_characteristic(&self) -> i64 {
        let index = EdgeIndex::build(&self.faces);
        index.vertex_count() as i64 - index.edge_count() as i64 + self.faces.len() as i64
    }

    /// Enclosed volume by the divergence theorem.
    pub fn volume(&self) -> f64 {
        self.faces.iter().map(Face::signed_volume).sum()
    }

    /// Centroid of the enclosed volume.
    pub fn centroid(&self) -> Point3d {
        let volume = self.volume();
        let moment = self
            .faces
            .iter()
            .fold(Vec3::ZERO, |acc, f| acc + f.volume_moment());
        if crate::default_tolerance().is_zero_volume(volume) {
            let vertices = self.vertices();
            return Point3d::centroid_of(&vertices).unwrap_or(Point3d::ORIGIN);
        }
        Point3d::ORIGIN + moment / volume
    }

    pub fn surface_area(&self) -> f64 {
        self.faces.iter().map(Face::area).sum()
    }

    pub fn audit(&self) -> ManifoldAudit {
        let audit = ManifoldAudit::of_faces(&self.faces);
        info!(
            euler = audit.euler_characteristic,
            findings = audit.findings.len(),
            "solid audited"
        );
        audit
    }

    /// Split by `plane`. A plane that does not cross the interior yields the
    /// solid itself as the only element.
    pub fn slice(&self, plane: &Plane) -> Result<Vec<Solid>, KernelError> {
        boolean::slice_solid(self, plane)
    }

    /// Split by each plane in turn. Output order is unspecified.
    pub fn slice_by_planes(&self, planes: &[Plane]) -> Result<Vec<Solid>, KernelError> {
        boolean::slice_by_planes(self, planes)
    }
}

impl Shift for Solid {
    type Output = Result<Solid, KernelError>;

    /// Orientation is re-derived, so mirroring transforms are handled too.
    fn shift(&self, transform: &AffineTransform) -> Self::Output {
        let faces = self
            .faces
            .iter()
            .map(|f| f.shift(transform))
            .collect::<Result<Vec<_>, _>>()?;
        Solid::new(faces)
    }
}
