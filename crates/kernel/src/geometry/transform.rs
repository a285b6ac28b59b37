use serde::{Deserialize, Serialize};
use solid_linalg::{Matrix, MatrixError, MATRIX_EPSILON};

use super::line::{Line3d, Segment3d};
use super::plane::Plane;
use super::point::Point3d;
use super::vector::{Direction, Vec3};
use crate::error::KernelError;
use crate::traits::Shift;

/// A right-handed rotation by `angle` radians about an axis through the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub axis: Direction,
    pub angle: f64,
}

impl Rotation {
    pub fn new(axis: Direction, angle: f64) -> Self {
        Self { axis, angle }
    }

    pub fn about_x(angle: f64) -> Self {
        Self::new(Direction::X, angle)
    }

    pub fn about_y(angle: f64) -> Self {
        Self::new(Direction::Y, angle)
    }

    pub fn about_z(angle: f64) -> Self {
        Self::new(Direction::Z, angle)
    }

    fn matrix(&self) -> Result<Matrix, MatrixError> {
        Matrix::rotation_about_axis(self.axis.as_vec3().to_array(), self.angle)
    }
}

/// A 4x4 homogeneous transform acting on column vectors: `p' = M * [p; 1]`.
///
/// Two transforms are equal when they move the origin to the same place and
/// share the same 3x3 block, both within tolerance. There is no `Hash`
/// implementation since no hash is consistent with tolerant equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffineTransform {
    matrix: Matrix,
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix::identity(4),
        }
    }

    /// Fails with `NonFinite` when any offset component is NaN or infinite.
    pub fn translation(offset: Vec3) -> Result<Self, KernelError> {
        let mut rows = identity_rows();
        rows[0][3] = offset.x;
        rows[1][3] = offset.y;
        rows[2][3] = offset.z;
        Self::from_rows(rows)
    }

    /// Rotation about an axis through the origin.
    pub fn rotation(rotation: &Rotation) -> Result<Self, KernelError> {
        let block = rotation.matrix()?;
        let mut rows = identity_rows();
        for (i, row) in rows.iter_mut().take(3).enumerate() {
            for (j, value) in row.iter_mut().take(3).enumerate() {
                *value = block[(i, j)];
            }
        }
        Self::from_rows(rows)
    }

    /// Rotation about an axis through `pivot` instead of the origin.
    pub fn rotation_about(rotation: &Rotation, pivot: Point3d) -> Result<Self, KernelError> {
        let to_origin = Self::translation(-pivot.to_vec3())?;
        let back = Self::translation(pivot.to_vec3())?;
        to_origin.compose(&Self::rotation(rotation)?)?.compose(&back)
    }

    /// Apply `rotations` in order, then translate by `translation`.
    pub fn from_rotations(rotations: &[Rotation], translation: Vec3) -> Result<Self, KernelError> {
        let mut transform = Self::identity();
        for rotation in rotations {
            transform = transform.compose(&Self::rotation(rotation)?)?;
        }
        transform.compose(&Self::translation(translation)?)
    }

    /// Wrap an existing matrix. Only the shape is checked; `Matrix` already
    /// holds finite entries.
    pub fn from_matrix(matrix: Matrix) -> Result<Self, KernelError> {
        if matrix.shape() != (4, 4) {
            return Err(MatrixError::DimensionMismatch {
                op: "affine transform",
                lhs: matrix.shape(),
                rhs: (4, 4),
            }
            .into());
        }
        Ok(Self { matrix })
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// The transform that applies `self` first and `next` second. A product
    /// that overflows is reported as `NonFinite`.
    pub fn compose(&self, next: &AffineTransform) -> Result<AffineTransform, KernelError> {
        let mut rows = [[0.0; 4]; 4];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (0..4).map(|k| next.matrix[(i, k)] * self.matrix[(k, j)]).sum();
            }
        }
        Self::from_rows(rows)
    }

    pub fn inverse(&self) -> Result<AffineTransform, KernelError> {
        Ok(Self {
            matrix: self.matrix.inverse()?,
        })
    }

    /// Where the origin goes.
    pub fn translation_part(&self) -> Point3d {
        self.apply_point(&Point3d::ORIGIN)
    }

    /// The upper-left 3x3 block.
    pub fn rotation_part(&self) -> [[f64; 3]; 3] {
        let mut r = [[0.0; 3]; 3];
        for (i, row) in r.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = self.matrix[(i, j)];
            }
        }
        r
    }

    pub fn apply_point(&self, p: &Point3d) -> Point3d {
        let m = &self.matrix;
        let h = [p.x, p.y, p.z, 1.0];
        let row = |i: usize| (0..4).map(|k| m[(i, k)] * h[k]).sum::<f64>();
        let w = row(3);
        let w = if w.abs() > MATRIX_EPSILON { w } else { 1.0 };
        Point3d::new(row(0) / w, row(1) / w, row(2) / w)
    }

    /// Apply the 3x3 block only.
    pub fn apply_vector(&self, v: &Vec3) -> Vec3 {
        let m = &self.matrix;
        let h = [v.x, v.y, v.z];
        let row = |i: usize| (0..3).map(|k| m[(i, k)] * h[k]).sum::<f64>();
        Vec3::new(row(0), row(1), row(2))
    }

    fn from_rows(rows: [[f64; 4]; 4]) -> Result<Self, KernelError> {
        Ok(Self {
            matrix: Matrix::from_rows(&rows)?,
        })
    }
}

fn identity_rows() -> [[f64; 4]; 4] {
    let mut rows = [[0.0; 4]; 4];
    for (i, row) in rows.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    rows
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for AffineTransform {
    fn eq(&self, other: &Self) -> bool {
        let tolerance = crate::default_tolerance();
        if !self
            .translation_part()
            .approx_eq(&other.translation_part(), tolerance.coincidence)
        {
            return false;
        }
        let a = self.rotation_part();
        let b = other.rotation_part();
        a.iter()
            .flatten()
            .zip(b.iter().flatten())
            .all(|(x, y)| (x - y).abs() <= tolerance.matrix)
    }
}

impl Shift for Point3d {
    type Output = Point3d;

    fn shift(&self, transform: &AffineTransform) -> Point3d {
        transform.apply_point(self)
    }
}

impl Shift for Vec3 {
    type Output = Vec3;

    fn shift(&self, transform: &AffineTransform) -> Vec3 {
        transform.apply_vector(self)
    }
}

impl Shift for Segment3d {
    type Output = Segment3d;

    fn shift(&self, transform: &AffineTransform) -> Segment3d {
        Segment3d::new(transform.apply_point(&self.start), transform.apply_point(&self.end))
    }
}

impl Shift for Line3d {
    type Output = Result<Line3d, KernelError>;

    fn shift(&self, transform: &AffineTransform) -> Self::Output {
        let direction = Direction::try_from(transform.apply_vector(&self.direction.as_vec3()))?;
        Ok(Line3d::new(transform.apply_point(&self.origin), direction))
    }
}

impl Shift for Plane {
    type Output = Result<Plane, KernelError>;

    /// Maps the origin and two in-plane vectors, so the result stays correct
    /// for non-rigid transforms as well.
    fn shift(&self, transform: &AffineTransform) -> Self::Output {
        let (u, v) = self.basis();
        Plane::from_points(
            transform.apply_point(&self.origin),
            transform.apply_point(&(self.origin + u)),
            transform.apply_point(&(self.origin + v)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_translation() {
        let t = AffineTransform::translation(Vec3::new(10.0, 20.0, 30.0)).unwrap();
        let p = t.apply_point(&Point3d::new(1.0, 2.0, 3.0));
        assert!(p.approx_eq(&Point3d::new(11.0, 22.0, 33.0), 1e-12));
        let v = t.apply_vector(&Vec3::X);
        assert!(v.approx_eq(&Vec3::X, 1e-12));
    }

    #[test]
    fn test_rotation_z_90() {
        let t = AffineTransform::rotation(&Rotation::about_z(FRAC_PI_2)).unwrap();
        let p = t.apply_point(&Point3d::new(1.0, 0.0, 0.0));
        assert!(p.approx_eq(&Point3d::new(0.0, 1.0, 0.0), 1e-12));
    }

    #[test]
    fn test_compose_applies_self_first() {
        let rotate = AffineTransform::rotation(&Rotation::about_z(FRAC_PI_2)).unwrap();
        let translate = AffineTransform::translation(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        let p = Point3d::new(1.0, 0.0, 0.0);

        let rotate_then_translate = rotate.compose(&translate).unwrap().apply_point(&p);
        assert!(rotate_then_translate.approx_eq(&Point3d::new(1.0, 1.0, 0.0), 1e-12));

        let translate_then_rotate = translate.compose(&rotate).unwrap().apply_point(&p);
        assert!(translate_then_rotate.approx_eq(&Point3d::new(0.0, 2.0, 0.0), 1e-12));
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let t = AffineTransform::from_rotations(
            &[Rotation::about_x(0.3), Rotation::about_y(-1.1)],
            Vec3::new(4.0, -2.0, 7.0),
        )
        .unwrap();
        let inv = t.inverse().unwrap();
        assert_eq!(t.compose(&inv).unwrap(), AffineTransform::identity());
        assert_eq!(inv.compose(&t).unwrap(), AffineTransform::identity());
    }

    #[test]
    fn test_rotation_about_pivot() {
        let pivot = Point3d::new(1.0, 1.0, 0.0);
        let t = AffineTransform::rotation_about(&Rotation::about_z(PI), pivot).unwrap();
        assert!(t.apply_point(&pivot).approx_eq(&pivot, 1e-12));
        let p = t.apply_point(&Point3d::new(2.0, 1.0, 5.0));
        assert!(p.approx_eq(&Point3d::new(0.0, 1.0, 5.0), 1e-12));
    }

    #[test]
    fn test_translation_and_rotation_parts() {
        let t = AffineTransform::from_rotations(&[Rotation::about_z(FRAC_PI_2)], Vec3::new(0.0, 0.0, 3.0)).unwrap();
        assert!(t.translation_part().approx_eq(&Point3d::new(0.0, 0.0, 3.0), 1e-12));
        let r = t.rotation_part();
        assert!((r[1][0] - 1.0).abs() < 1e-12);
        assert!((r[0][1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_matrix_shape_check() {
        assert!(matches!(
            AffineTransform::from_matrix(Matrix::identity(3)),
            Err(KernelError::NumericSingularity(MatrixError::DimensionMismatch { .. }))
        ));
        let t = AffineTransform::from_matrix(Matrix::identity(4)).unwrap();
        assert_eq!(t, AffineTransform::identity());
    }

    #[test]
    fn test_singular_inverse_is_error() {
        let flat = Matrix::from_rows(&[
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
        .unwrap();
        let t = AffineTransform::from_matrix(flat).unwrap();
        assert!(matches!(
            t.inverse(),
            Err(KernelError::NumericSingularity(MatrixError::Singular { .. }))
        ));
    }

    #[test]
    fn test_equality_is_tolerant() {
        let a = AffineTransform::translation(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        let b = AffineTransform::translation(Vec3::new(1.0 + 1e-10, 0.0, 0.0)).unwrap();
        let c = AffineTransform::translation(Vec3::new(1.1, 0.0, 0.0)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_shift_plane() {
        let t = AffineTransform::rotation(&Rotation::about_x(FRAC_PI_2)).unwrap();
        let shifted = Plane::XY.shift(&t).unwrap();
        assert!(shifted.normal.approx_eq(&Direction::Y.reversed(), 1e-12));
        assert!(shifted.contains(&Point3d::ORIGIN));
    }

    #[test]
    fn test_non_finite_offset_is_rejected() {
        for offset in [
            Vec3::new(f64::NAN, 2.0, 0.0),
            Vec3::new(f64::INFINITY, 0.0, 0.0),
            Vec3::new(0.0, 0.0, f64::NEG_INFINITY),
        ] {
            assert!(matches!(
                AffineTransform::translation(offset),
                Err(KernelError::NumericSingularity(MatrixError::NonFinite { .. }))
            ));
        }
        let nan_pivot = AffineTransform::rotation_about(&Rotation::about_z(1.0), Point3d::new(f64::NAN, 0.0, 0.0));
        assert!(nan_pivot.is_err());
        assert!(AffineTransform::rotation(&Rotation::about_x(f64::NAN)).is_err());
    }

    #[test]
    fn test_overflowing_compose_is_rejected() {
        let far = AffineTransform::translation(Vec3::new(f64::MAX, 0.0, 0.0)).unwrap();
        assert!(matches!(
            far.compose(&far),
            Err(KernelError::NumericSingularity(MatrixError::NonFinite { .. }))
        ));
    }
}
