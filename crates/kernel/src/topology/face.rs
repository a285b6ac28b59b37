use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::geometry::line::Segment3d;
use crate::geometry::plane::{Plane, PlaneSide};
use crate::geometry::point::Point3d;
use crate::geometry::transform::AffineTransform;
use crate::geometry::vector::{Direction, Vec3};
use crate::traits::Shift;

/// An immutable planar polygon.
///
/// The vertex order defines the normal by the right-hand rule. Collinear
/// consecutive vertices are allowed so that a face can share a split edge
/// with its neighbour without T-junctions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFace")]
pub struct Face {
    vertices: Vec<Point3d>,
    normal: Direction,
    area: f64,
}

#[derive(Deserialize)]
struct RawFace {
    vertices: Vec<Point3d>,
}

impl TryFrom<RawFace> for Face {
    type Error = KernelError;

    fn try_from(raw: RawFace) -> Result<Self, Self::Error> {
        Face::new(raw.vertices)
    }
}

/// Result of cutting one face with a plane.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceSlice {
    /// The whole face when the plane does not cross it; otherwise the
    /// normal-side pieces followed by the opposite-side pieces.
    pub pieces: Vec<Face>,
    /// Stretches of the cut line inside the face, each oriented as in its
    /// normal-side piece.
    pub chords: Vec<Segment3d>,
}

impl Face {
    /// Validate and build a face from its boundary loop.
    pub fn new(vertices: Vec<Point3d>) -> Result<Self, KernelError> {
        let tol = crate::default_tolerance();
        if vertices.len() < 3 {
            return Err(KernelError::degenerate(format!(
                "a face needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if let Some(p) = vertices.iter().find(|p| !p.is_finite()) {
            return Err(KernelError::degenerate(format!("non-finite vertex {p:?}")));
        }
        for (i, p) in vertices.iter().enumerate() {
            let q = &vertices[(i + 1) % vertices.len()];
            if tol.points_coincident(p, q) {
                return Err(KernelError::degenerate(format!(
                    "consecutive vertices {i} and {} coincide at {p:?}",
                    (i + 1) % vertices.len()
                )));
            }
        }

        let newell = newell_vector(&vertices);
        let area = newell.length() / 2.0;
        if tol.is_zero_area(area) {
            return Err(KernelError::degenerate("face has zero area"));
        }
        let normal = Direction::try_from(newell)?;

        let face = Self {
            vertices,
            normal,
            area,
        };
        let plane = face.plane();
        if let Some(p) = face.vertices.iter().find(|p| !plane.contains(p)) {
            return Err(KernelError::degenerate(format!(
                "vertex {p:?} is {:.3e} off the face plane",
                plane.signed_distance(p)
            )));
        }
        if face.is_self_intersecting() {
            return Err(KernelError::degenerate("face boundary intersects itself"));
        }
        Ok(face)
    }

    pub fn vertices(&self) -> &[Point3d] {
        &self.vertices
    }

    pub fn normal(&self) -> Direction {
        self.normal
    }

    /// Supporting plane through the vertex centroid.
    pub fn plane(&self) -> Plane {
        Plane::new(self.centroid(), self.normal)
    }

    /// Mean of the vertices.
    pub fn centroid(&self) -> Point3d {
        Point3d::centroid_of(&self.vertices).unwrap_or(self.vertices[0])
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    /// Directed boundary edges in traversal order.
    pub fn edges(&self) -> impl Iterator<Item = Segment3d> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| Segment3d::new(self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// The vertex furthest against `direction`.
    pub fn lowest_vertex(&self, direction: &Direction) -> Point3d {
        self.vertices
            .iter()
            .copied()
            .min_by(|a, b| direction.dot(&a.to_vec3()).total_cmp(&direction.dot(&b.to_vec3())))
            .unwrap_or(self.vertices[0])
    }

    /// Same polygon traversed the other way; the first vertex is kept.
    pub fn reversed(&self) -> Self {
        let mut vertices = Vec::with_capacity(self.vertices.len());
        vertices.push(self.vertices[0]);
        vertices.extend(self.vertices[1..].iter().rev());
        Self {
            vertices,
            normal: self.normal.reversed(),
            area: self.area,
        }
    }

    /// True when some boundary edge of `self` has the same endpoints as one
    /// of `other`, in either direction.
    pub fn shares_exact_side(&self, other: &Face) -> bool {
        let eps = crate::default_tolerance().coincidence;
        self.edges().any(|e| other.edges().any(|o| e.matches(&o, eps)))
    }

    /// Signed volume of the cone from the origin over this face (divergence
    /// theorem). Summed over a closed outward-oriented shell it gives the
    /// enclosed volume.
    pub fn signed_volume(&self) -> f64 {
        let p0 = self.vertices[0].to_vec3();
        self.vertices[1..]
            .windows(2)
            .map(|w| p0.triple(&w[0].to_vec3(), &w[1].to_vec3()))
            .sum::<f64>()
            / 6.0
    }

    /// First moment of the origin cone, `volume * centroid`, used to compute
    /// solid centroids.
    pub(crate) fn volume_moment(&self) -> Vec3 {
        let p0 = self.vertices[0].to_vec3();
        self.vertices[1..]
            .windows(2)
            .map(|w| {
                let (a, b) = (w[0].to_vec3(), w[1].to_vec3());
                let v = p0.triple(&a, &b) / 6.0;
                (p0 + a + b) * (v / 4.0)
            })
            .fold(Vec3::ZERO, |acc, m| acc + m)
    }

    /// Side of `plane` for every vertex.
    pub fn vertex_sides(&self, plane: &Plane) -> Vec<PlaneSide> {
        self.vertices.iter().map(|p| plane.side_of(p)).collect()
    }

    /// Where `plane` first crosses this face, if it does. A concave face may
    /// be crossed several times; `slice` returns every chord.
    pub fn intersecting_segment(&self, plane: &Plane) -> Result<Option<Segment3d>, KernelError> {
        Ok(self.slice(plane)?.chords.into_iter().next())
    }

    /// Cut this face with `plane`.
    ///
    /// The boundary is walked once with every crossing point inserted, then
    /// each stretch of the cut line that runs through the interior becomes a
    /// chord shared by the two sides. Loops are traced per side, so a concave
    /// face crossed several times falls into several pieces. Vertices within
    /// tolerance of the plane belong to both sides, and crossing points are
    /// computed from the lexicographically ordered edge endpoints so both
    /// faces sharing an edge get the identical point.
    pub fn slice(&self, plane: &Plane) -> Result<FaceSlice, KernelError> {
        let sides = self.vertex_sides(plane);
        if !(sides.contains(&PlaneSide::Normal) && sides.contains(&PlaneSide::Opposite)) {
            return Ok(FaceSlice {
                pieces: vec![self.clone()],
                chords: Vec::new(),
            });
        }

        let n = self.vertices.len();
        let mut ring: Vec<(Point3d, PlaneSide)> = Vec::with_capacity(2 * n);
        for i in 0..n {
            let j = (i + 1) % n;
            ring.push((self.vertices[i], sides[i]));
            let crosses = matches!(
                (sides[i], sides[j]),
                (PlaneSide::Normal, PlaneSide::Opposite) | (PlaneSide::Opposite, PlaneSide::Normal)
            );
            if crosses {
                let x = plane
                    .intersect_segment(&self.vertices[i], &self.vertices[j])
                    .ok_or_else(|| KernelError::structural(format!("edge {i} crosses the plane without meeting it")))?;
                ring.push((x, PlaneSide::On));
            }
        }
        let m = ring.len();

        let face_normal = self.normal.as_vec3();
        let cut_normal = plane.normal.as_vec3();
        let mut normal_edges = Vec::with_capacity(m);
        let mut opposite_edges = Vec::with_capacity(m);
        for a in 0..m {
            let b = (a + 1) % m;
            let on_normal = match (ring[a].1, ring[b].1) {
                (PlaneSide::Normal, _) | (_, PlaneSide::Normal) => true,
                (PlaneSide::Opposite, _) | (_, PlaneSide::Opposite) => false,
                // Interior lies to the left of an edge on the plane.
                _ => face_normal.cross(&(ring[b].0 - ring[a].0)).dot(&cut_normal) > 0.0,
            };
            if on_normal {
                normal_edges.push((a, b));
            } else {
                opposite_edges.push((a, b));
            }
        }

        let (u, v) = self.plane().basis();
        let flat: Vec<[f64; 2]> = ring
            .iter()
            .map(|(p, _)| [p.to_vec3().dot(&u), p.to_vec3().dot(&v)])
            .collect();

        // The normal side lies to the left of `along`.
        let along = cut_normal.cross(&face_normal);
        let mut on_plane: Vec<usize> = (0..m).filter(|&k| ring[k].1 == PlaneSide::On).collect();
        on_plane.sort_by(|&a, &b| {
            (ring[a].0 - plane.origin)
                .dot(&along)
                .total_cmp(&(ring[b].0 - plane.origin).dot(&along))
        });

        let eps = crate::default_tolerance().coincidence;
        let mut chords = Vec::new();
        for pair in on_plane.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if (a + 1) % m == b || (b + 1) % m == a {
                continue;
            }
            let mid = [(flat[a][0] + flat[b][0]) / 2.0, (flat[a][1] + flat[b][1]) / 2.0];
            let on_boundary = (0..m).any(|k| point_segment_distance(mid, flat[k], flat[(k + 1) % m]) <= eps);
            if on_boundary || !winds_around(&flat, mid) {
                continue;
            }
            normal_edges.push((a, b));
            opposite_edges.push((b, a));
            chords.push(Segment3d::new(ring[a].0, ring[b].0));
        }

        let mut pieces = Vec::new();
        for edges in [normal_edges, opposite_edges] {
            for boundary in trace_loops(&flat, &edges)? {
                pieces.push(Face::new(loop_points(&ring, &boundary))?);
            }
        }
        Ok(FaceSlice { pieces, chords })
    }

    fn is_self_intersecting(&self) -> bool {
        let eps = crate::default_tolerance().coincidence;
        let n = self.vertices.len();
        let pts: Vec<[f64; 2]> = self.vertices.iter().map(|p| project(p, &self.normal)).collect();
        let seg = |i: usize| (pts[i], pts[(i + 1) % n]);

        for i in 0..n {
            // Adjacent edges may only meet at their shared vertex.
            let (a, b) = seg(i);
            let (_, c) = seg((i + 1) % n);
            if folds_back(a, b, c, eps) {
                return true;
            }
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let (p, q) = seg(j);
                if segment_distance(a, b, p, q) <= eps {
                    return true;
                }
            }
        }
        false
    }
}

impl Shift for Face {
    type Output = Result<Face, KernelError>;

    fn shift(&self, transform: &AffineTransform) -> Self::Output {
        Face::new(self.vertices.iter().map(|p| transform.apply_point(p)).collect())
    }
}

/// Newell's method: twice the vector area of a planar polygon.
fn newell_vector(vertices: &[Point3d]) -> Vec3 {
    let n = vertices.len();
    (0..n).fold(Vec3::ZERO, |acc, i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        acc + Vec3::new(
            (a.y - b.y) * (a.z + b.z),
            (a.z - b.z) * (a.x + b.x),
            (a.x - b.x) * (a.y + b.y),
        )
    })
}

/// Drop the coordinate along the dominant normal axis.
fn project(p: &Point3d, normal: &Direction) -> [f64; 2] {
    let n = normal.as_vec3();
    let (ax, ay, az) = (n.x.abs(), n.y.abs(), n.z.abs());
    if az >= ax && az >= ay {
        [p.x, p.y]
    } else if ay >= ax {
        [p.z, p.x]
    } else {
        [p.y, p.z]
    }
}

fn cross2(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn point_segment_distance(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let len2 = ab[0] * ab[0] + ab[1] * ab[1];
    let t = if len2 > 0.0 {
        (((p[0] - a[0]) * ab[0] + (p[1] - a[1]) * ab[1]) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let c = [a[0] + t * ab[0], a[1] + t * ab[1]];
    ((p[0] - c[0]).powi(2) + (p[1] - c[1]).powi(2)).sqrt()
}

fn segment_distance(a: [f64; 2], b: [f64; 2], p: [f64; 2], q: [f64; 2]) -> f64 {
    let d1 = cross2(a, b, p);
    let d2 = cross2(a, b, q);
    let d3 = cross2(p, q, a);
    let d4 = cross2(p, q, b);
    if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
        return 0.0;
    }
    point_segment_distance(a, p, q)
        .min(point_segment_distance(b, p, q))
        .min(point_segment_distance(p, a, b))
        .min(point_segment_distance(q, a, b))
}

/// `a -> b -> c` doubles back along a line.
fn folds_back(a: [f64; 2], b: [f64; 2], c: [f64; 2], eps: f64) -> bool {
    let u = [b[0] - a[0], b[1] - a[1]];
    let v = [c[0] - b[0], c[1] - b[1]];
    let lu = (u[0] * u[0] + u[1] * u[1]).sqrt();
    let lv = (v[0] * v[0] + v[1] * v[1]).sqrt();
    if lu <= eps || lv <= eps {
        return false;
    }
    // Distance of the shorter edge's far end from the longer edge's line.
    let cross = u[0] * v[1] - u[1] * v[0];
    let dot = u[0] * v[0] + u[1] * v[1];
    cross.abs() <= eps * lu.max(lv) && dot < 0.0
}

/// Nonzero winding number of the closed polygon `poly` around `p`.
fn winds_around(poly: &[[f64; 2]], p: [f64; 2]) -> bool {
    let n = poly.len();
    let turn: f64 = (0..n)
        .map(|i| {
            let a = [poly[i][0] - p[0], poly[i][1] - p[1]];
            let b = [poly[(i + 1) % n][0] - p[0], poly[(i + 1) % n][1] - p[1]];
            (a[0] * b[1] - a[1] * b[0]).atan2(a[0] * b[0] + a[1] * b[1])
        })
        .sum();
    turn.abs() > PI
}

/// Chain directed edges into closed loops. Where a vertex has several
/// unused outgoing edges, the walk takes the sharpest clockwise turn so each
/// loop bounds a single region on its left.
fn trace_loops(flat: &[[f64; 2]], edges: &[(usize, usize)]) -> Result<Vec<Vec<usize>>, KernelError> {
    let heading = |from: usize, to: usize| (flat[to][1] - flat[from][1]).atan2(flat[to][0] - flat[from][0]);
    let mut used = vec![false; edges.len()];
    let mut loops = Vec::new();

    while let Some(first) = used.iter().position(|u| !u) {
        used[first] = true;
        let start = edges[first].0;
        let mut boundary = vec![start];
        let (mut prev, mut cur) = edges[first];
        loop {
            let back = heading(cur, prev);
            let next = edges
                .iter()
                .enumerate()
                .filter(|&(k, &(from, _))| from == cur && (!used[k] || k == first))
                .map(|(k, &(_, to))| {
                    let mut turn = (back - heading(cur, to)).rem_euclid(TAU);
                    if turn <= 0.0 {
                        turn = TAU;
                    }
                    (k, turn)
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(k, _)| k)
                .ok_or_else(|| KernelError::structural("region boundary does not close"))?;
            if next == first {
                break;
            }
            used[next] = true;
            boundary.push(cur);
            prev = cur;
            cur = edges[next].1;
        }
        loops.push(boundary);
    }
    Ok(loops)
}

/// Positions of a traced loop without repeated neighbours.
fn loop_points(ring: &[(Point3d, PlaneSide)], boundary: &[usize]) -> Vec<Point3d> {
    let tol = crate::default_tolerance();
    let mut pts: Vec<Point3d> = Vec::with_capacity(boundary.len());
    for &k in boundary {
        let p = ring[k].0;
        if pts.last().map_or(true, |q| !tol.points_coincident(q, &p)) {
            pts.push(p);
        }
    }
    while pts.len() > 1 && tol.points_coincident(&pts[0], &pts[pts.len() - 1]) {
        pts.pop();
    }
    pts
}
