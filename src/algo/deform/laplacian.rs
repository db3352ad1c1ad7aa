//! Weighted graph Laplacian.

use crate::mesh::NeighborTable;

use super::weights::EdgeWeights;

/// Sparse cotangent Laplacian stored row by row.
///
/// Row `i` holds `(j, -w_ij)` for every neighbor `j` followed by the diagonal
/// entry `(i, sum_j w_ij)`, so each row sums to zero.
#[derive(Debug, Clone)]
pub struct Laplacian {
    rows: Vec<Vec<(usize, f64)>>,
}

impl Laplacian {
    /// Entries `(column, coefficient)` of row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[(usize, f64)] {
        &self.rows[i]
    }

    /// Diagonal coefficient of row `i` (zero for vertices without neighbors).
    pub fn diagonal(&self, i: usize) -> f64 {
        self.rows[i]
            .iter()
            .find(|&&(j, _)| j == i)
            .map_or(0.0, |&(_, c)| c)
    }

    /// Sum of the coefficients of row `i`.
    pub fn row_sum(&self, i: usize) -> f64 {
        self.rows[i].iter().map(|&(_, c)| c).sum()
    }

    /// Number of rows (one per mesh vertex).
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Total number of stored entries.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// Assemble the Laplacian from edge weights.
///
/// Vertices without neighbors get an empty row.
pub fn build_laplacian(
    weights: &EdgeWeights,
    num_vertices: usize,
    neighbors: &NeighborTable,
) -> Laplacian {
    let mut rows = Vec::with_capacity(num_vertices);

    for i in 0..num_vertices {
        let ring = neighbors.neighbors(i);
        if ring.is_empty() {
            rows.push(Vec::new());
            continue;
        }

        let mut row = Vec::with_capacity(ring.len() + 1);
        let mut diagonal = 0.0;
        for &j in ring {
            let w = weights.weight(i, j);
            row.push((j, -w));
            diagonal += w;
        }
        row.push((i, diagonal));
        rows.push(row);
    }

    Laplacian { rows }
}
