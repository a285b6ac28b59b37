use std::fmt;
use std::ops::{Index, Mul};

use approx::AbsDiffEq;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Absolute tolerance for element-wise matrix comparison and zero pivots.
pub const MATRIX_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    #[error("non-finite value {value} at ({row}, {col})")]
    NonFinite { row: usize, col: usize, value: f64 },

    #[error("row {row} has {len} entries, expected {expected}")]
    RaggedRows { row: usize, len: usize, expected: usize },

    #[error("dimension mismatch in {op}: {lhs:?} vs {rhs:?}")]
    DimensionMismatch {
        op: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    },

    #[error("{op} requires a square matrix, got {rows}x{cols}")]
    NotSquare { op: &'static str, rows: usize, cols: usize },

    #[error("index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("matrix is singular: no usable pivot in column {column}")]
    Singular { column: usize },

    #[error("rotation axis has zero length")]
    ZeroAxis,

    #[error("not a rotation matrix: {reason}")]
    NotRotation { reason: String },
}

/// A dense, row/column addressed matrix of finite `f64` values.
///
/// Equality is element-wise within [`MATRIX_EPSILON`]; two matrices of
/// different shapes are never equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matrix {
    data: DMatrix<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: DMatrix::zeros(rows, cols),
        }
    }

    pub fn identity(n: usize) -> Self {
        Self {
            data: DMatrix::identity(n, n),
        }
    }

    /// Build a matrix from a list of rows. Every row must have the same length
    /// and every value must be finite.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, MatrixError> {
        let expected = rows.first().map_or(0, |r| r.as_ref().len());
        let mut flat = Vec::with_capacity(rows.len() * expected);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != expected {
                return Err(MatrixError::RaggedRows {
                    row: i,
                    len: row.len(),
                    expected,
                });
            }
            flat.extend_from_slice(row);
        }
        Self::from_row_slice(rows.len(), expected, &flat)
    }

    /// Build a `rows x cols` matrix from row-major data.
    pub fn from_row_slice(rows: usize, cols: usize, values: &[f64]) -> Result<Self, MatrixError> {
        if values.len() != rows * cols {
            return Err(MatrixError::DimensionMismatch {
                op: "from_row_slice",
                lhs: (rows, cols),
                rhs: (values.len(), 1),
            });
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(MatrixError::NonFinite {
                row: idx / cols.max(1),
                col: idx % cols.max(1),
                value: values[idx],
            });
        }
        Ok(Self {
            data: DMatrix::from_row_slice(rows, cols, values),
        })
    }

    pub(crate) fn from_dmatrix(data: DMatrix<f64>) -> Self {
        Self { data }
    }

    /// Borrow the underlying nalgebra storage.
    pub fn as_dmatrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    pub fn is_square(&self) -> bool {
        self.rows() == self.cols()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixError> {
        self.check_index(row, col)?;
        if !value.is_finite() {
            return Err(MatrixError::NonFinite { row, col, value });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        (row < self.rows()).then(|| self.data.row(row).iter().copied().collect())
    }

    pub fn column(&self, col: usize) -> Option<Vec<f64>> {
        (col < self.cols()).then(|| self.data.column(col).iter().copied().collect())
    }

    pub fn set_row(&mut self, row: usize, values: &[f64]) -> Result<(), MatrixError> {
        if values.len() != self.cols() {
            return Err(MatrixError::DimensionMismatch {
                op: "set_row",
                lhs: self.shape(),
                rhs: (1, values.len()),
            });
        }
        self.check_index(row, 0)?;
        for (col, &value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(MatrixError::NonFinite { row, col, value });
            }
        }
        for (col, &value) in values.iter().enumerate() {
            self.data[(row, col)] = value;
        }
        Ok(())
    }

    pub fn set_column(&mut self, col: usize, values: &[f64]) -> Result<(), MatrixError> {
        if values.len() != self.rows() {
            return Err(MatrixError::DimensionMismatch {
                op: "set_column",
                lhs: self.shape(),
                rhs: (values.len(), 1),
            });
        }
        self.check_index(0, col)?;
        for (row, &value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(MatrixError::NonFinite { row, col, value });
            }
        }
        for (row, &value) in values.iter().enumerate() {
            self.data[(row, col)] = value;
        }
        Ok(())
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.check_same_shape("add", other)?;
        Ok(Self::from_dmatrix(&self.data + &other.data))
    }

    pub fn sub(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.check_same_shape("sub", other)?;
        Ok(Self::from_dmatrix(&self.data - &other.data))
    }

    /// Matrix product `self * other`.
    pub fn mul(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols() != other.rows() {
            return Err(MatrixError::DimensionMismatch {
                op: "mul",
                lhs: self.shape(),
                rhs: other.shape(),
            });
        }
        Ok(Self::from_dmatrix(&self.data * &other.data))
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        Self::from_dmatrix(&self.data * factor)
    }

    pub fn transpose(&self) -> Matrix {
        Self::from_dmatrix(self.data.transpose())
    }

    pub fn trace(&self) -> Result<f64, MatrixError> {
        self.require_square("trace")?;
        Ok(self.data.trace())
    }

    pub fn is_identity(&self) -> bool {
        self.is_square() && *self == Matrix::identity(self.rows())
    }

    /// Copy out the `rows x cols` block whose top-left corner is at
    /// `(row_start, col_start)`.
    pub fn submatrix(
        &self,
        row_start: usize,
        col_start: usize,
        rows: usize,
        cols: usize,
    ) -> Result<Matrix, MatrixError> {
        if row_start + rows > self.rows() || col_start + cols > self.cols() {
            return Err(MatrixError::IndexOutOfBounds {
                row: row_start + rows,
                col: col_start + cols,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        let block = self.data.view((row_start, col_start), (rows, cols)).into_owned();
        Ok(Self::from_dmatrix(block))
    }

    /// Drop the given rows (any order, duplicates ignored).
    pub fn remove_rows(&self, indices: &[usize]) -> Result<Matrix, MatrixError> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.rows()) {
            return Err(MatrixError::IndexOutOfBounds {
                row: bad,
                col: 0,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        let kept: Vec<usize> = (0..self.rows()).filter(|r| !indices.contains(r)).collect();
        let data = DMatrix::from_fn(kept.len(), self.cols(), |r, c| self.data[(kept[r], c)]);
        Ok(Self::from_dmatrix(data))
    }

    /// Drop the given columns (any order, duplicates ignored).
    pub fn remove_columns(&self, indices: &[usize]) -> Result<Matrix, MatrixError> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.cols()) {
            return Err(MatrixError::IndexOutOfBounds {
                row: 0,
                col: bad,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        let kept: Vec<usize> = (0..self.cols()).filter(|c| !indices.contains(c)).collect();
        let data = DMatrix::from_fn(self.rows(), kept.len(), |r, c| self.data[(r, kept[c])]);
        Ok(Self::from_dmatrix(data))
    }

    /// Determinant via LU decomposition. A singular square matrix has
    /// determinant zero rather than an error.
    pub fn determinant(&self) -> Result<f64, MatrixError> {
        match self.decompose() {
            Ok(lu) => Ok(lu.determinant()),
            Err(MatrixError::Singular { .. }) => Ok(0.0),
            Err(e) => Err(e),
        }
    }

    pub fn is_invertible(&self) -> bool {
        self.decompose().is_ok()
    }

    pub fn inverse(&self) -> Result<Matrix, MatrixError> {
        Ok(self.decompose()?.inverse())
    }

    /// Solve `self * x = rhs` for `x`. `rhs` may hold several columns.
    pub fn solve(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        self.decompose()?.solve(rhs)
    }

    pub(crate) fn require_square(&self, op: &'static str) -> Result<(), MatrixError> {
        if self.is_square() {
            Ok(())
        } else {
            Err(MatrixError::NotSquare {
                op,
                rows: self.rows(),
                cols: self.cols(),
            })
        }
    }

    fn check_index(&self, row: usize, col: usize) -> Result<(), MatrixError> {
        if row < self.rows() && col < self.cols() {
            Ok(())
        } else {
            Err(MatrixError::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
        }
    }

    fn check_same_shape(&self, op: &'static str, other: &Matrix) -> Result<(), MatrixError> {
        if self.shape() == other.shape() {
            Ok(())
        } else {
            Err(MatrixError::DimensionMismatch {
                op,
                lhs: self.shape(),
                rhs: other.shape(),
            })
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[index]
    }
}

impl Mul<f64> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: f64) -> Matrix {
        self.scale(rhs)
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.abs_diff_eq(other, MATRIX_EPSILON)
    }
}

impl AbsDiffEq for Matrix {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        MATRIX_EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows() {
            let row: Vec<String> = (0..self.cols()).map(|c| format!("{:.6}", self.data[(r, c)])).collect();
            writeln!(f, "[{}]", row.join(", "))?;
        }
        Ok(())
    }
}
