//! Plane slicing of solids.
//!
//! 1. Quick reject when every vertex is on one side of the plane.
//! 2. Slice each face, classify each piece into the normal-side or
//!    opposite-side accumulator.
//! 3. Close both accumulators with caps in the cutting plane.
//! 4. Split each accumulator into connected shells and rebuild each through
//!    orientation repair.

use tracing::{debug, info, instrument, warn};

use super::cap::synthesize_caps;
use super::classify::classify_face;
use crate::error::KernelError;
use crate::geometry::plane::{Plane, PlaneSide};
use crate::topology::face::{Face, FaceSlice};
use crate::topology::solid::Solid;
use crate::topology::weld::EdgeIndex;

/// Split `solid` by `plane`.
///
/// Pieces on the normal side come first. A plane that leaves every vertex
/// on one side, or that only grazes the boundary, returns the solid itself as
/// the single element. A concave solid can fall apart into more than two
/// pieces.
#[instrument(level = "debug", skip(solid), fields(faces = solid.faces().len()))]
pub fn slice_solid(solid: &Solid, plane: &Plane) -> Result<Vec<Solid>, KernelError> {
    let vertices = solid.vertices();
    let crosses_normal = vertices.iter().any(|p| plane.side_of(p) == PlaneSide::Normal);
    let crosses_opposite = vertices.iter().any(|p| plane.side_of(p) == PlaneSide::Opposite);
    if !(crosses_normal && crosses_opposite) {
        debug!("plane does not cross the solid");
        return Ok(vec![solid.clone()]);
    }

    let mut normal_faces = Vec::new();
    let mut opposite_faces = Vec::new();
    let mut chords = 0usize;
    for face in solid.faces() {
        let FaceSlice { pieces, chords: cut } = face.slice(plane)?;
        chords += cut.len();
        for piece in pieces {
            match classify_face(&piece, plane)? {
                PlaneSide::Normal => normal_faces.push(piece),
                _ => opposite_faces.push(piece),
            }
        }
    }
    debug!(
        normal = normal_faces.len(),
        opposite = opposite_faces.len(),
        chords,
        "faces classified"
    );

    if normal_faces.is_empty() || opposite_faces.is_empty() {
        warn!("cut left one side empty, returning the solid unchanged");
        return Ok(vec![solid.clone()]);
    }

    let caps = synthesize_caps(&normal_faces, plane)?;
    opposite_faces.extend(caps.iter().map(Face::reversed));
    normal_faces.extend(caps);

    let mut pieces = into_solids(normal_faces)?;
    pieces.extend(into_solids(opposite_faces)?);
    info!(pieces = pieces.len(), chords, "plane slice complete");
    Ok(pieces)
}

/// Slice by each plane in turn, every active piece by every plane. A piece a
/// plane misses passes through unchanged. Output order is unspecified.
#[instrument(level = "debug", skip(solid, planes), fields(planes = planes.len()))]
pub fn slice_by_planes(solid: &Solid, planes: &[Plane]) -> Result<Vec<Solid>, KernelError> {
    let mut active = vec![solid.clone()];
    for plane in planes {
        let mut next = Vec::with_capacity(active.len() * 2);
        for piece in &active {
            next.extend(slice_solid(piece, plane)?);
        }
        active = next;
    }
    info!(pieces = active.len(), "batch slice complete");
    Ok(active)
}

/// One solid per edge-connected group of faces.
fn into_solids(faces: Vec<Face>) -> Result<Vec<Solid>, KernelError> {
    let groups = EdgeIndex::build(&faces).components();
    if groups.len() == 1 {
        return Ok(vec![Solid::new(faces)?]);
    }
    groups
        .into_iter()
        .map(|group| Solid::new(group.into_iter().map(|i| faces[i].clone()).collect()))
        .collect()
}
