use tracing::{info, instrument};

use super::face::Face;
use super::solid::Solid;
use crate::error::KernelError;
use crate::geometry::point::Point3d;

/// Axis-aligned box spanning two opposite corners.
#[instrument]
pub fn make_box(min: Point3d, max: Point3d) -> Result<Solid, KernelError> {
    info!("creating box primitive");
    let (x0, y0, z0) = (min.x.min(max.x), min.y.min(max.y), min.z.min(max.z));
    let (x1, y1, z1) = (min.x.max(max.x), min.y.max(max.y), min.z.max(max.z));
    let v = [
        Point3d::new(x0, y0, z0), // 0: bottom-front-left
        Point3d::new(x1, y0, z0), // 1: bottom-front-right
        Point3d::new(x1, y1, z0), // 2: bottom-back-right
        Point3d::new(x0, y1, z0), // 3: bottom-back-left
        Point3d::new(x0, y0, z1), // 4: top-front-left
        Point3d::new(x1, y0, z1), // 5: top-front-right
        Point3d::new(x1, y1, z1), // 6: top-back-right
        Point3d::new(x0, y1, z1), // 7: top-back-left
    ];

    // Outward normals by right-hand winding.
    let face_defs: [[usize; 4]; 6] = [
        [0, 3, 2, 1], // bottom (-Z)
        [4, 5, 6, 7], // top    (+Z)
        [0, 1, 5, 4], // front  (-Y)
        [3, 7, 6, 2], // back   (+Y)
        [0, 4, 7, 3], // left   (-X)
        [1, 2, 6, 5], // right  (+X)
    ];
    let faces = face_defs
        .iter()
        .map(|idx| Face::new(idx.iter().map(|&i| v[i]).collect()))
        .collect::<Result<Vec<_>, _>>()?;
    Solid::from_oriented_faces(faces)
}

/// Tetrahedron on four non-coplanar points, in any order.
#[instrument]
pub fn make_tetrahedron(points: [Point3d; 4]) -> Result<Solid, KernelError> {
    info!("creating tetrahedron primitive");
    let [a, b, c, d] = points;
    let faces = [[a, b, c], [a, b, d], [a, c, d], [b, c, d]]
        .into_iter()
        .map(|tri| Face::new(tri.to_vec()))
        .collect::<Result<Vec<_>, _>>()?;
    Solid::new(faces)
}

/// Convex polygon `base` extruded by `height` along its own normal.
/// A negative height extrudes against the normal.
#[instrument(skip(base), fields(base_vertices = base.len()))]
pub fn make_prism(base: &[Point3d], height: f64) -> Result<Solid, KernelError> {
    info!(height, "creating prism primitive");
    let bottom = Face::new(base.to_vec())?;
    if crate::default_tolerance().is_zero_length(height) || !height.is_finite() {
        return Err(KernelError::degenerate(format!("prism height {height} is degenerate")));
    }
    let offset = bottom.normal().as_vec3() * height;
    let top_ring: Vec<Point3d> = base.iter().map(|p| *p + offset).collect();
    let n = base.len();

    let mut faces = Vec::with_capacity(n + 2);
    faces.push(bottom);
    faces.push(Face::new(top_ring.clone())?);
    for i in 0..n {
        let j = (i + 1) % n;
        faces.push(Face::new(vec![base[i], base[j], top_ring[j], top_ring[i]])?);
    }
    Solid::new(faces)
}
