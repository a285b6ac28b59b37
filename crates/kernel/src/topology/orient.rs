//! Orientation repair: turn an unordered bag of planar faces claimed to bound
//! one closed solid into a consistently outward-oriented shell.
//!
//! A seed face is oriented from geometry alone, then orientation spreads
//! across shared edges: two outward faces traverse a shared edge in opposite
//! directions. The frontier holds the edges owned by exactly one placed face.

use std::collections::BTreeMap;

use tracing::{debug, info, instrument, warn};

use super::face::Face;
use super::weld::{undirected, DirectedEdge, EdgeIndex};
use crate::error::KernelError;
use crate::geometry::vector::Direction;

/// Return `faces` with every face traversed so its normal points out of the
/// enclosed volume. Output order matches input order; a face set that is
/// already consistent comes back unchanged.
#[instrument(level = "debug", skip(faces), fields(faces = faces.len()))]
pub fn repair_orientation(faces: &[Face]) -> Result<Vec<Face>, KernelError> {
    if faces.len() < 4 {
        return Err(KernelError::degenerate(format!(
            "a closed solid needs at least 4 faces, got {}",
            faces.len()
        )));
    }

    let index = EdgeIndex::build(faces);
    if let Some((edge, uses)) = index.uses.iter().find(|(_, uses)| uses.len() != 2) {
        let (a, b) = index.segment(*edge).unwrap_or_default();
        return Err(KernelError::structural(format!(
            "edge {a:?} -> {b:?} is used by {} faces",
            uses.len()
        )));
    }

    let seed = select_seed(faces)?;
    let mut flipped = vec![false; faces.len()];
    let mut placed = vec![false; faces.len()];
    flipped[seed] = faces[seed].normal().dot(&Direction::UP.as_vec3()) > 0.0;
    debug!(seed, flipped = flipped[seed], "seed face chosen");

    // undirected key -> direction as traversed by the owning placed face
    let mut frontier: BTreeMap<DirectedEdge, DirectedEdge> = BTreeMap::new();
    place(seed, &index, &mut placed, &flipped, &mut frontier)?;
    let mut placed_count = 1;

    while let Some((key, owned)) = frontier.pop_first() {
        let Some(uses) = index.uses.get(&key) else {
            continue;
        };
        let Some(next) = uses.iter().find(|u| !placed[u.face]) else {
            return Err(KernelError::structural("frontier edge has no unplaced neighbour"));
        };
        flipped[next.face] = next.directed == owned;
        frontier.insert(key, owned);
        place(next.face, &index, &mut placed, &flipped, &mut frontier)?;
        placed_count += 1;
    }

    if placed_count < faces.len() {
        return Err(KernelError::structural(format!(
            "propagation stalled with {} of {} faces unplaced",
            faces.len() - placed_count,
            faces.len()
        )));
    }

    let mut repaired: Vec<Face> = faces
        .iter()
        .zip(&flipped)
        .map(|(f, &flip)| if flip { f.reversed() } else { f.clone() })
        .collect();

    let volume: f64 = repaired.iter().map(Face::signed_volume).sum();
    if volume < 0.0 {
        warn!(volume, "propagated shell encloses negative volume, flipping all faces");
        repaired = repaired.iter().map(Face::reversed).collect();
    }

    let flips = repaired
        .iter()
        .zip(faces)
        .filter(|(r, f)| r.normal() != f.normal())
        .count();
    info!(faces = faces.len(), flips, "orientation repair complete");
    Ok(repaired)
}

/// Lowest non-vertical face along [`Direction::UP`], ties broken by the
/// lowest centroid.
fn select_seed(faces: &[Face]) -> Result<usize, KernelError> {
    let up = Direction::UP;
    let angular = crate::default_tolerance().angular;
    let height = |face: &Face| up.dot(&face.lowest_vertex(&up).to_vec3());
    let centroid_height = |face: &Face| up.dot(&face.centroid().to_vec3());
    let coincidence = crate::default_tolerance().coincidence;

    faces
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.normal().is_perpendicular_to(&up, angular))
        .min_by(|(_, a), (_, b)| {
            let (ha, hb) = (height(a), height(b));
            if (ha - hb).abs() <= coincidence {
                centroid_height(a).total_cmp(&centroid_height(b))
            } else {
                ha.total_cmp(&hb)
            }
        })
        .map(|(i, _)| i)
        .ok_or_else(|| KernelError::structural("no face can seed orientation: every face is vertical"))
}

/// Mark `face` placed and merge its oriented edges into the frontier.
/// An edge already on the frontier is now owned twice and leaves it; it must
/// be traversed the other way by the earlier owner.
fn place(
    face: usize,
    index: &EdgeIndex,
    placed: &mut [bool],
    flipped: &[bool],
    frontier: &mut BTreeMap<DirectedEdge, DirectedEdge>,
) -> Result<(), KernelError> {
    placed[face] = true;
    for (a, b) in index.face_edges(face) {
        let directed = if flipped[face] { (b, a) } else { (a, b) };
        let key = undirected(directed);
        match frontier.remove(&key) {
            Some(owned) if owned == directed => {
                let (p, q) = index.segment(directed).unwrap_or_default();
                return Err(KernelError::structural(format!(
                    "faces cannot be oriented consistently across edge {p:?} -> {q:?}"
                )));
            }
            Some(_) => {}
            None => {
                frontier.insert(key, directed);
            }
        }
    }
    Ok(())
}
