//! Rotation-matrix factories and extraction of Euler angles and quaternions
//! from the 3x3 rotation block of a matrix.

use nalgebra::Quaternion;
use serde::{Deserialize, Serialize};

use crate::matrix::{Matrix, MatrixError, MATRIX_EPSILON};

/// Rotation angles (radians) about X, then Y, then Z: `R = Rz * Ry * Rx`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Matrix {
    /// Right-handed rotation about the X axis.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::rotation_from_entries([[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]])
    }

    /// Right-handed rotation about the Y axis.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::rotation_from_entries([[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]])
    }

    /// Right-handed rotation about the Z axis.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::rotation_from_entries([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Rotation about an arbitrary axis through the origin (Rodrigues' formula).
    /// The axis does not need to be normalized but must not be zero.
    pub fn rotation_about_axis(axis: [f64; 3], angle: f64) -> Result<Self, MatrixError> {
        let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
        if !len.is_finite() || len < MATRIX_EPSILON {
            return Err(MatrixError::ZeroAxis);
        }
        let (x, y, z) = (axis[0] / len, axis[1] / len, axis[2] / len);
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;

        #[rustfmt::skip]
        let entries = [
            [t * x * x + c,     t * x * y - s * z, t * x * z + s * y],
            [t * x * y + s * z, t * y * y + c,     t * y * z - s * x],
            [t * x * z - s * y, t * y * z + s * x, t * z * z + c    ],
        ];
        Ok(Self::rotation_from_entries(entries))
    }

    /// The upper-left 3x3 block, checked to be a proper rotation
    /// (orthonormal with determinant +1).
    pub fn rotation_block(&self) -> Result<[[f64; 3]; 3], MatrixError> {
        if self.rows() < 3 || self.cols() < 3 {
            return Err(MatrixError::NotRotation {
                reason: format!("{}x{} matrix has no 3x3 block", self.rows(), self.cols()),
            });
        }
        let mut r = [[0.0; 3]; 3];
        for (i, row) in r.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = self[(i, j)];
            }
        }

        for i in 0..3 {
            for j in 0..3 {
                let dot: f64 = (0..3).map(|k| r[k][i] * r[k][j]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                if (dot - expected).abs() > MATRIX_EPSILON.sqrt() {
                    return Err(MatrixError::NotRotation {
                        reason: format!("columns {i} and {j} are not orthonormal"),
                    });
                }
            }
        }
        let det = r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
            - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
            + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0]);
        if det < 0.0 {
            return Err(MatrixError::NotRotation {
                reason: "determinant is negative (reflection)".to_string(),
            });
        }
        Ok(r)
    }

    /// Euler angles in x, y, z order such that `R = Rz(z) * Ry(y) * Rx(x)`.
    ///
    /// At gimbal lock (`y = ±π/2`) only `x - z` (or `x + z`) is determined; `z`
    /// is reported as zero.
    pub fn euler_angles(&self) -> Result<EulerAngles, MatrixError> {
        let r = self.rotation_block()?;
        let sin_y = -r[2][0];
        if sin_y.abs() < 1.0 - MATRIX_EPSILON {
            Ok(EulerAngles {
                x: r[2][1].atan2(r[2][2]),
                y: sin_y.asin(),
                z: r[1][0].atan2(r[0][0]),
            })
        } else if sin_y > 0.0 {
            Ok(EulerAngles {
                x: r[0][1].atan2(r[0][2]),
                y: std::f64::consts::FRAC_PI_2,
                z: 0.0,
            })
        } else {
            Ok(EulerAngles {
                x: (-r[0][1]).atan2(-r[0][2]),
                y: -std::f64::consts::FRAC_PI_2,
                z: 0.0,
            })
        }
    }

    /// Unit quaternion of the rotation block (Shepperd's method), with a
    /// non-negative scalar part.
    pub fn quaternion(&self) -> Result<Quaternion<f64>, MatrixError> {
        let r = self.rotation_block()?;
        let trace = r[0][0] + r[1][1] + r[2][2];

        let (w, x, y, z) = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            (0.25 * s, (r[2][1] - r[1][2]) / s, (r[0][2] - r[2][0]) / s, (r[1][0] - r[0][1]) / s)
        } else if r[0][0] > r[1][1] && r[0][0] > r[2][2] {
            let s = (1.0 + r[0][0] - r[1][1] - r[2][2]).sqrt() * 2.0;
            ((r[2][1] - r[1][2]) / s, 0.25 * s, (r[0][1] + r[1][0]) / s, (r[0][2] + r[2][0]) / s)
        } else if r[1][1] > r[2][2] {
            let s = (1.0 + r[1][1] - r[0][0] - r[2][2]).sqrt() * 2.0;
            ((r[0][2] - r[2][0]) / s, (r[0][1] + r[1][0]) / s, 0.25 * s, (r[1][2] + r[2][1]) / s)
        } else {
            let s = (1.0 + r[2][2] - r[0][0] - r[1][1]).sqrt() * 2.0;
            ((r[1][0] - r[0][1]) / s, (r[0][2] + r[2][0]) / s, (r[1][2] + r[2][1]) / s, 0.25 * s)
        };

        let q = Quaternion::new(w, x, y, z);
        Ok(if w < 0.0 { -q } else { q })
    }

    fn rotation_from_entries(entries: [[f64; 3]; 3]) -> Self {
        let flat: Vec<f64> = entries.iter().flatten().copied().collect();
        Matrix::from_dmatrix(nalgebra::DMatrix::from_row_slice(3, 3, &flat))
    }
}
