//! Sparse matrix assembly and Cholesky factorization.
//!
//! The reduced ARAP system is assembled as triplets into a compressed sparse
//! row matrix and factored once with faer's supernodal LLᵀ. The factorization
//! is then reused for the three coordinate back-substitutions of every frame
//! until the free-vertex set changes.

use faer::linalg::solvers::Solve;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};
use faer::sparse::{SparseColMat, Triplet};
use faer::Side;
use nalgebra::DVector;

use crate::error::{DeformError, Result};

/// Compressed Sparse Row (CSR) matrix.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    /// Number of rows.
    rows: usize,
    /// Number of columns.
    cols: usize,
    /// Row pointers: row_ptr[i] is the index in col_idx/values where row i starts.
    /// Length is rows + 1, with row_ptr[rows] = nnz.
    row_ptr: Vec<usize>,
    /// Column indices for each non-zero value.
    col_idx: Vec<usize>,
    /// Non-zero values.
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries at the same (row, col) are summed.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            debug_assert!(row < rows && col < cols, "triplet ({}, {}) out of bounds", row, col);
            if last == Some((row, col)) {
                // Same position: accumulate value
                if let Some(acc) = values.last_mut() {
                    *acc += val;
                }
            } else {
                col_idx.push(col);
                values.push(val);
                row_ptr[row + 1] += 1;
                last = Some((row, col));
            }
        }

        // Per-row counts to offsets
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get the number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over the stored `(row, col, value)` entries in row order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.rows).flat_map(move |row| {
            (self.row_ptr[row]..self.row_ptr[row + 1])
                .map(move |k| (row, self.col_idx[k], self.values[k]))
        })
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.cols, "Vector dimension mismatch");

        let mut y = DVector::zeros(self.rows);
        for (row, col, val) in self.entries() {
            y[row] += val * x[col];
        }
        y
    }
}

/// Sparse Cholesky (LLᵀ) factorization of a symmetric positive definite matrix.
pub struct CholeskyFactor {
    llt: Llt<usize, f64>,
    dimension: usize,
}

impl CholeskyFactor {
    /// Factor a square SPD matrix (symbolic analysis followed by numeric LLᵀ).
    ///
    /// Only the upper triangle is read, so a full symmetric matrix is accepted.
    pub fn factorize(matrix: &CsrMatrix) -> Result<Self> {
        if matrix.nrows() != matrix.ncols() {
            return Err(DeformError::Factorization(format!(
                "matrix must be square, got {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        if matrix.nrows() == 0 {
            return Err(DeformError::Factorization("cannot factorize an empty matrix".into()));
        }

        let triplets: Vec<Triplet<usize, usize, f64>> = matrix
            .entries()
            .map(|(row, col, val)| Triplet { row, col, val })
            .collect();
        let csc = SparseColMat::try_new_from_triplets(matrix.nrows(), matrix.ncols(), &triplets)
            .map_err(|e| DeformError::Factorization(format!("invalid sparse matrix: {e:?}")))?;

        let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
            .map_err(|e| DeformError::Factorization(format!("symbolic analysis failed: {e:?}")))?;
        let llt = Llt::try_new_with_symbolic(symbolic, csc.as_ref(), Side::Upper)
            .map_err(|e| DeformError::Factorization(format!("numeric factorization failed: {e:?}")))?;

        Ok(Self {
            llt,
            dimension: matrix.nrows(),
        })
    }

    /// Dimension `N` of the factored `N x N` matrix.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Solve `A x = b` with the cached factorization.
    pub fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>> {
        DeformError::check_len("right-hand side", self.dimension, rhs.len())?;

        let b = faer::Mat::from_fn(self.dimension, 1, |i, _| rhs[i]);
        let x = self.llt.solve(&b);

        Ok((0..self.dimension).map(|i| x[(i, 0)]).collect())
    }
}

impl std::fmt::Debug for CholeskyFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CholeskyFactor")
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}
