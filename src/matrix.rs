//! Dense linear-algebra kernel for the steady-state solver.
//!
//! A deliberately small surface: transpose, dimension-checked multiply, the
//! homogenising pad used by the Markov balance equations, and full inversion
//! via LU decomposition with scaled partial pivoting. Everything is `f64`
//! and row-major `Vec` storage — matrices here are at most
//! `num_states + 1` wide, so no sparse or blocked representation is needed.
//!
//! # Invariants
//!
//! - Pivot selection takes the row with the largest *scaled* absolute value
//!   in the current column; ties go to the lowest row index, which keeps the
//!   decomposition (and therefore every downstream code assignment)
//!   deterministic.
//! - [`Matrix::invert`] fails with [`EncodeError::SingularMatrix`] when an
//!   entire pivot column is numerically zero. There is no tiny-pivot
//!   substitution: a singular system must surface as an error.

use core::ops::{Index, IndexMut};

use crate::error::EncodeError;

/// Scaled pivot magnitudes at or below this threshold are treated as zero.
const SINGULAR_EPS: f64 = 1e-12;

// ─── Matrix ─────────────────────────────────────────────────────────────────

/// A dense row-major `f64` matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a `rows × cols` matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create the `n × n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Build a matrix from nested rows. All rows must have equal length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut m = Self::zeros(rows.len(), n_cols);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), n_cols, "ragged rows in Matrix::from_rows");
            for (j, v) in row.iter().enumerate() {
                m[(i, j)] = *v;
            }
        }
        m
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The transposed matrix.
    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t[(j, i)] = self[(i, j)];
            }
        }
        t
    }

    /// Matrix product `self · other`.
    ///
    /// Fails with [`EncodeError::DimensionMismatch`] when the inner
    /// dimensions disagree.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix, EncodeError> {
        if self.cols != other.rows {
            return Err(EncodeError::DimensionMismatch {
                left_rows: self.rows,
                left_cols: self.cols,
                right_rows: other.rows,
                right_cols: other.cols,
            });
        }
        let mut c = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a_ik = self[(i, k)];
                if a_ik == 0.0 {
                    continue;
                }
                for j in 0..other.cols {
                    c[(i, j)] += a_ik * other[(k, j)];
                }
            }
        }
        Ok(c)
    }

    /// Homogenising pad for the Markov balance equations.
    ///
    /// For a square `n × n` matrix `A`, returns the `n × (n+1)` matrix
    /// `B = [A − I | 1]`: the identity is subtracted from the diagonal and a
    /// constant-1 column is appended. Solving `π · B = (0, …, 0, 1)` in the
    /// least-squares sense then yields the stationary distribution with the
    /// normalisation constraint folded in.
    pub fn pad(&self) -> Matrix {
        assert_eq!(self.rows, self.cols, "pad requires a square matrix");
        let n = self.rows;
        let mut b = Matrix::zeros(n, n + 1);
        for i in 0..n {
            for j in 0..n {
                b[(i, j)] = self[(i, j)] - if i == j { 1.0 } else { 0.0 };
            }
            b[(i, n)] = 1.0;
        }
        b
    }

    /// Full inverse via LU decomposition with scaled partial pivoting and
    /// column-by-column back-substitution.
    ///
    /// Fails with [`EncodeError::SingularMatrix`] when elimination encounters
    /// a pivot column that is numerically zero.
    pub fn invert(&self) -> Result<Matrix, EncodeError> {
        assert_eq!(self.rows, self.cols, "invert requires a square matrix");
        let n = self.rows;
        let mut lu = self.clone();
        let perm = lu_decompose(&mut lu)?;

        let mut inv = Matrix::zeros(n, n);
        let mut col = vec![0.0; n];
        for j in 0..n {
            for v in col.iter_mut() {
                *v = 0.0;
            }
            col[j] = 1.0;
            lu_back_substitute(&lu, &perm, &mut col);
            for i in 0..n {
                inv[(i, j)] = col[i];
            }
        }
        Ok(inv)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.cols + j]
    }
}

// ─── LU decomposition ───────────────────────────────────────────────────────

/// Crout LU decomposition with scaled partial pivoting, in place.
///
/// On success `a` holds both factors (unit-diagonal L below, U on and above
/// the diagonal) and the returned vector records the row interchanges for
/// [`lu_back_substitute`].
fn lu_decompose(a: &mut Matrix) -> Result<Vec<usize>, EncodeError> {
    let n = a.rows();
    let mut perm = vec![0usize; n];

    // Implicit row scaling: a row of all zeros is already singular.
    let mut scale = vec![0.0; n];
    for i in 0..n {
        let mut big: f64 = 0.0;
        for j in 0..n {
            let mag = a[(i, j)].abs();
            if mag > big {
                big = mag;
            }
        }
        if big <= SINGULAR_EPS {
            return Err(EncodeError::SingularMatrix);
        }
        scale[i] = 1.0 / big;
    }

    for j in 0..n {
        for i in 0..j {
            let mut sum = a[(i, j)];
            for k in 0..i {
                sum -= a[(i, k)] * a[(k, j)];
            }
            a[(i, j)] = sum;
        }

        // Pick the pivot row: largest scaled magnitude, lowest index on ties.
        let mut big: f64 = 0.0;
        let mut imax = j;
        for i in j..n {
            let mut sum = a[(i, j)];
            for k in 0..j {
                sum -= a[(i, k)] * a[(k, j)];
            }
            a[(i, j)] = sum;
            let weighted = scale[i] * sum.abs();
            if weighted > big {
                big = weighted;
                imax = i;
            }
        }
        if big <= SINGULAR_EPS {
            return Err(EncodeError::SingularMatrix);
        }

        if j != imax {
            for k in 0..n {
                let tmp = a[(imax, k)];
                a[(imax, k)] = a[(j, k)];
                a[(j, k)] = tmp;
            }
            scale[imax] = scale[j];
        }
        perm[j] = imax;

        if j != n - 1 {
            let inv_pivot = 1.0 / a[(j, j)];
            for i in (j + 1)..n {
                a[(i, j)] *= inv_pivot;
            }
        }
    }

    Ok(perm)
}

/// Solve `A · x = b` in place given the LU factors and row permutation from
/// [`lu_decompose`]. `b` is overwritten with the solution.
fn lu_back_substitute(lu: &Matrix, perm: &[usize], b: &mut [f64]) {
    let n = lu.rows();

    // Forward substitution through L, unscrambling the permutation as we go.
    let mut first_nonzero: Option<usize> = None;
    for i in 0..n {
        let ip = perm[i];
        let mut sum = b[ip];
        b[ip] = b[i];
        if let Some(ii) = first_nonzero {
            for j in ii..i {
                sum -= lu[(i, j)] * b[j];
            }
        } else if sum != 0.0 {
            first_nonzero = Some(i);
        }
        b[i] = sum;
    }

    // Back substitution through U.
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= lu[(i, j)] * b[j];
        }
        b[i] = sum / lu[(i, i)];
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{a} !~ {b}");
    }

    #[test]
    fn test_transpose_swaps_dimensions() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let t = m.transpose();
        assert_eq!(t.rows(), 3);
        assert_eq!(t.cols(), 2);
        assert_eq!(t[(2, 0)], 3.0);
        assert_eq!(t[(0, 1)], 4.0);
    }

    #[test]
    fn test_multiply_known_product() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = Matrix::from_rows(&[vec![5.0, 6.0], vec![7.0, 8.0]]);
        let c = a.multiply(&b).unwrap();
        assert_eq!(c[(0, 0)], 19.0);
        assert_eq!(c[(0, 1)], 22.0);
        assert_eq!(c[(1, 0)], 43.0);
        assert_eq!(c[(1, 1)], 50.0);
    }

    #[test]
    fn test_multiply_dimension_mismatch() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 2);
        let err = a.multiply(&b).unwrap_err();
        assert!(matches!(err, EncodeError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_pad_shape_and_values() {
        let a = Matrix::from_rows(&[vec![0.0, 1.0], vec![0.5, 0.5]]);
        let b = a.pad();
        assert_eq!(b.rows(), 2);
        assert_eq!(b.cols(), 3);
        // Diagonal shifted by -1, last column all ones.
        assert_eq!(b[(0, 0)], -1.0);
        assert_eq!(b[(0, 1)], 1.0);
        assert_eq!(b[(1, 1)], -0.5);
        assert_eq!(b[(0, 2)], 1.0);
        assert_eq!(b[(1, 2)], 1.0);
    }

    #[test]
    fn test_invert_identity() {
        let inv = Matrix::identity(4).invert().unwrap();
        for i in 0..4 {
            for j in 0..4 {
                assert_close(inv[(i, j)], if i == j { 1.0 } else { 0.0 }, 1e-12);
            }
        }
    }

    #[test]
    fn test_invert_known_2x2() {
        let a = Matrix::from_rows(&[vec![4.0, 7.0], vec![2.0, 6.0]]);
        let inv = a.invert().unwrap();
        assert_close(inv[(0, 0)], 0.6, 1e-12);
        assert_close(inv[(0, 1)], -0.7, 1e-12);
        assert_close(inv[(1, 0)], -0.2, 1e-12);
        assert_close(inv[(1, 1)], 0.4, 1e-12);
    }

    #[test]
    fn test_invert_requires_pivoting() {
        // Zero in the (0, 0) position forces a row interchange.
        let a = Matrix::from_rows(&[vec![0.0, 1.0], vec![1.0, 0.0]]);
        let inv = a.invert().unwrap();
        assert_close(inv[(0, 0)], 0.0, 1e-12);
        assert_close(inv[(0, 1)], 1.0, 1e-12);
        assert_close(inv[(1, 0)], 1.0, 1e-12);
    }

    #[test]
    fn test_singular_matrix_rejected() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]);
        assert_eq!(a.invert().unwrap_err(), EncodeError::SingularMatrix);
    }

    #[test]
    fn test_zero_row_rejected() {
        let a = Matrix::from_rows(&[vec![0.0, 0.0], vec![1.0, 2.0]]);
        assert_eq!(a.invert().unwrap_err(), EncodeError::SingularMatrix);
    }

    proptest! {
        /// A diagonally dominant matrix is always invertible, and the
        /// product with its inverse must recover the identity.
        #[test]
        fn prop_inverse_times_original_is_identity(
            entries in proptest::collection::vec(-1.0f64..1.0, 16)
        ) {
            let n = 4;
            let mut a = Matrix::zeros(n, n);
            for i in 0..n {
                for j in 0..n {
                    a[(i, j)] = entries[i * n + j];
                }
                // Dominant diagonal keeps the matrix far from singular.
                a[(i, i)] = 4.0 + entries[i * n + i];
            }
            let inv = a.invert().unwrap();
            let prod = a.multiply(&inv).unwrap();
            for i in 0..n {
                for j in 0..n {
                    let expect = if i == j { 1.0 } else { 0.0 };
                    prop_assert!((prod[(i, j)] - expect).abs() < 1e-9);
                }
            }
        }
    }
}
