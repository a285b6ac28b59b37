use nalgebra::DMatrix;
use tracing::{debug, instrument};

use crate::matrix::{Matrix, MatrixError, MATRIX_EPSILON};

/// Doolittle LU factorization `P * A = L * U` stored in one combined matrix.
///
/// The strictly lower triangle holds `L` (its unit diagonal is implicit), the
/// upper triangle including the diagonal holds `U`.
#[derive(Debug, Clone)]
pub struct LuDecomposition {
    combined: Matrix,
    /// `permutation[i]` is the row of the original matrix now at row `i`.
    permutation: Vec<usize>,
    /// +1 or -1 depending on the parity of the row swaps.
    sign: f64,
}

impl Matrix {
    /// LU decomposition with partial pivoting.
    ///
    /// For each pivot column the remaining row with the largest magnitude is
    /// swapped into place, so a zero or tiny diagonal entry is replaced by
    /// any usable row below it. When every remaining entry of the column is
    /// numerically zero the matrix is singular.
    #[instrument(level = "trace", skip(self), fields(n = self.rows()))]
    pub fn decompose(&self) -> Result<LuDecomposition, MatrixError> {
        self.require_square("decompose")?;
        let n = self.rows();
        let mut a: DMatrix<f64> = self.as_dmatrix().clone();
        let mut permutation: Vec<usize> = (0..n).collect();
        let mut sign = 1.0;

        for k in 0..n {
            let Some(best) = pivot_row(&a, k) else {
                debug!(column = k, "no usable pivot, matrix is singular");
                return Err(MatrixError::Singular { column: k });
            };
            if best != k {
                a.swap_rows(k, best);
                permutation.swap(k, best);
                sign = -sign;
            }

            let pivot = a[(k, k)];
            for i in (k + 1)..n {
                let factor = a[(i, k)] / pivot;
                a[(i, k)] = factor;
                for j in (k + 1)..n {
                    let upper = a[(k, j)];
                    a[(i, j)] -= factor * upper;
                }
            }
        }

        Ok(LuDecomposition {
            combined: Matrix::from_dmatrix(a),
            permutation,
            sign,
        })
    }
}

/// Row at or below `k` with the largest magnitude in column `k`, unless even
/// that entry is numerically zero. Ties keep the upper row.
fn pivot_row(a: &DMatrix<f64>, k: usize) -> Option<usize> {
    let mut best = k;
    for i in (k + 1)..a.nrows() {
        if a[(i, k)].abs() > a[(best, k)].abs() {
            best = i;
        }
    }
    (a[(best, k)].abs() > MATRIX_EPSILON).then_some(best)
}

impl LuDecomposition {
    pub fn size(&self) -> usize {
        self.combined.rows()
    }

    /// The combined L\U matrix as produced by the decomposition.
    pub fn combined(&self) -> &Matrix {
        &self.combined
    }

    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Parity of the row swaps, +1 or -1.
    pub fn sign(&self) -> f64 {
        self.sign
    }

    /// Unit-diagonal lower triangle `L`.
    pub fn extract_lower(&self) -> Matrix {
        let n = self.size();
        let data = self.combined.as_dmatrix();
        Matrix::from_dmatrix(DMatrix::from_fn(n, n, |r, c| match r.cmp(&c) {
            std::cmp::Ordering::Greater => data[(r, c)],
            std::cmp::Ordering::Equal => 1.0,
            std::cmp::Ordering::Less => 0.0,
        }))
    }

    /// Upper triangle `U` including the diagonal.
    pub fn extract_upper(&self) -> Matrix {
        let n = self.size();
        let data = self.combined.as_dmatrix();
        Matrix::from_dmatrix(DMatrix::from_fn(n, n, |r, c| if r <= c { data[(r, c)] } else { 0.0 }))
    }

    /// Permutation matrix `P` with `P * A = L * U`.
    pub fn permutation_matrix(&self) -> Matrix {
        let n = self.size();
        Matrix::from_dmatrix(DMatrix::from_fn(n, n, |r, c| {
            if self.permutation[r] == c { 1.0 } else { 0.0 }
        }))
    }

    pub fn determinant(&self) -> f64 {
        let data = self.combined.as_dmatrix();
        (0..self.size()).fold(self.sign, |acc, i| acc * data[(i, i)])
    }

    /// Solve `A * x = rhs` column by column.
    pub fn solve(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        let n = self.size();
        if rhs.rows() != n {
            return Err(MatrixError::DimensionMismatch {
                op: "solve",
                lhs: (n, n),
                rhs: rhs.shape(),
            });
        }
        let mut out = DMatrix::zeros(n, rhs.cols());
        for col in 0..rhs.cols() {
            let b: Vec<f64> = (0..n).map(|r| rhs[(r, col)]).collect();
            let x = self.solve_column(&b);
            for (r, value) in x.into_iter().enumerate() {
                out[(r, col)] = value;
            }
        }
        Ok(Matrix::from_dmatrix(out))
    }

    pub fn inverse(&self) -> Matrix {
        let n = self.size();
        let mut out = DMatrix::zeros(n, n);
        for col in 0..n {
            let mut e = vec![0.0; n];
            e[col] = 1.0;
            for (r, value) in self.solve_column(&e).into_iter().enumerate() {
                out[(r, col)] = value;
            }
        }
        Matrix::from_dmatrix(out)
    }

    fn solve_column(&self, b: &[f64]) -> Vec<f64> {
        let n = self.size();
        let lu = self.combined.as_dmatrix();

        // Forward substitution on P*b with the unit lower triangle.
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut sum = b[self.permutation[i]];
            for j in 0..i {
                sum -= lu[(i, j)] * y[j];
            }
            y[i] = sum;
        }

        // Back substitution with the upper triangle.
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = y[i];
            for j in (i + 1)..n {
                sum -= lu[(i, j)] * x[j];
            }
            x[i] = sum / lu[(i, i)];
        }
        x
    }
}
