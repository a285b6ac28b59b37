//! Vertex welding and edge adjacency over a face list.
//!
//! Faces store raw coordinates. Everything that needs topology (repair,
//! audits, cap assembly) first welds tolerance-equal points into one
//! [`VertexId`] and then talks about edges as pairs of ids.

use std::collections::{BTreeMap, HashMap};

use slotmap::{new_key_type, SlotMap};

use super::face::Face;
use crate::geometry::point::Point3d;

new_key_type! {
    pub struct VertexId;
}

/// A directed edge between two welded vertices.
pub type DirectedEdge = (VertexId, VertexId);

/// Undirected key for a directed edge: the endpoints in key order.
pub fn undirected((a, b): DirectedEdge) -> DirectedEdge {
    if a <= b { (a, b) } else { (b, a) }
}

/// Points welded within a distance tolerance.
#[derive(Debug, Clone)]
pub struct VertexPool {
    points: SlotMap<VertexId, Point3d>,
    tolerance: f64,
}

impl Default for VertexPool {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexPool {
    pub fn new() -> Self {
        Self::with_tolerance(crate::default_tolerance().coincidence)
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            points: SlotMap::with_key(),
            tolerance,
        }
    }

    /// Id of an existing point within tolerance, or a new one.
    pub fn insert(&mut self, p: Point3d) -> VertexId {
        match self.find(&p) {
            Some(id) => id,
            None => self.points.insert(p),
        }
    }

    pub fn find(&self, p: &Point3d) -> Option<VertexId> {
        self.points
            .iter()
            .find(|(_, q)| q.approx_eq(p, self.tolerance))
            .map(|(id, _)| id)
    }

    pub fn point(&self, id: VertexId) -> Option<Point3d> {
        self.points.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VertexId, &Point3d)> {
        self.points.iter()
    }

    /// Weld every vertex of `face`, keeping its traversal order.
    pub fn weld_face(&mut self, face: &Face) -> Vec<VertexId> {
        face.vertices().iter().map(|p| self.insert(*p)).collect()
    }
}

/// One face's use of an undirected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeUse {
    pub face: usize,
    /// The direction the face traverses the edge.
    pub directed: DirectedEdge,
}

/// Welded vertex loops of a face list plus, for every undirected edge, the
/// faces that use it.
#[derive(Debug, Clone)]
pub struct EdgeIndex {
    pub pool: VertexPool,
    pub loops: Vec<Vec<VertexId>>,
    pub uses: BTreeMap<DirectedEdge, Vec<EdgeUse>>,
}

impl EdgeIndex {
    pub fn build(faces: &[Face]) -> Self {
        let mut pool = VertexPool::new();
        let loops: Vec<Vec<VertexId>> = faces.iter().map(|f| pool.weld_face(f)).collect();
        let mut uses: BTreeMap<DirectedEdge, Vec<EdgeUse>> = BTreeMap::new();
        for (face, ids) in loops.iter().enumerate() {
            for directed in loop_edges(ids) {
                uses.entry(undirected(directed))
                    .or_default()
                    .push(EdgeUse { face, directed });
            }
        }
        Self { pool, loops, uses }
    }

    pub fn vertex_count(&self) -> usize {
        self.pool.len()
    }

    pub fn edge_count(&self) -> usize {
        self.uses.len()
    }

    /// Directed edges of face `face` in traversal order.
    pub fn face_edges(&self, face: usize) -> Vec<DirectedEdge> {
        self.loops.get(face).map(|ids| loop_edges(ids).collect()).unwrap_or_default()
    }

    pub fn segment(&self, (a, b): DirectedEdge) -> Option<(Point3d, Point3d)> {
        Some((self.pool.point(a)?, self.pool.point(b)?))
    }

    /// Groups of face indices connected through shared edges, each group in
    /// ascending index order, groups ordered by their smallest index.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut parent: Vec<usize> = (0..self.loops.len()).collect();
        fn root(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }
        for edge_uses in self.uses.values() {
            for pair in edge_uses.windows(2) {
                let a = root(&mut parent, pair[0].face);
                let b = root(&mut parent, pair[1].face);
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
        let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
        for face in 0..self.loops.len() {
            let r = root(&mut parent, face);
            groups.entry(r).or_default().push(face);
        }
        let mut result: Vec<Vec<usize>> = groups.into_values().collect();
        result.sort_by_key(|g| g[0]);
        result
    }
}

/// Consecutive pairs of a closed vertex loop, wrapping at the end.
pub fn loop_edges(ids: &[VertexId]) -> impl Iterator<Item = DirectedEdge> + '_ {
    ids.iter()
        .enumerate()
        .map(move |(i, &a)| (a, ids[(i + 1) % ids.len()]))
}
