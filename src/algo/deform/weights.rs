//! Cotangent edge weights.
//!
//! The weight of an undirected edge `{i, j}` is the average of the cotangents
//! of the angles opposite the edge in its (up to two) adjacent triangles, or
//! the single cotangent on a boundary edge. Negative cotangents (obtuse
//! opposite angles) are clamped to zero, so every weight is finite and
//! non-negative.

use std::collections::HashMap;

use log::warn;
use nalgebra::Point3;

use crate::mesh::{EdgeKey, NeighborTable, OppositeVertexTable};

/// Below this length a corner direction cannot be normalized.
const DEGENERATE_LENGTH: f64 = 1e-12;

/// Below this sine the opposite angle is treated as flat (0 or 180 degrees).
const DEGENERATE_SINE: f64 = 1e-12;

/// Symmetric per-edge weights keyed by undirected edge.
#[derive(Debug, Clone, Default)]
pub struct EdgeWeights {
    weights: HashMap<EdgeKey, f64>,
}

impl EdgeWeights {
    /// Weight of edge `{i, j}`, or `None` if the vertices are not adjacent.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.weights.get(&EdgeKey::undirected(i, j)).copied()
    }

    /// Weight of edge `{i, j}`, zero if the vertices are not adjacent.
    #[inline]
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.get(i, j).unwrap_or(0.0)
    }

    /// Number of weighted edges.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether no edge carries a weight.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterate over `(i, j, w)` with `i < j`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.weights.iter().map(|(key, &w)| {
            let (i, j) = key.endpoints();
            (i, j, w)
        })
    }
}

/// Compute cotangent weights for every edge of the neighbor table.
///
/// # Arguments
///
/// * `rest` - Rest-pose vertex positions
/// * `neighbors` - One-ring adjacency
/// * `opposite` - Opposite vertex per directed edge
pub fn build_weights(
    rest: &[Point3<f64>],
    neighbors: &NeighborTable,
    opposite: &OppositeVertexTable,
) -> EdgeWeights {
    let mut weights = HashMap::with_capacity(neighbors.num_edges());

    for (i, j) in neighbors.edges() {
        let cot_alpha = opposite.get(i, j).map(|k| opposite_cotangent(rest, i, j, k));
        let cot_beta = opposite.get(j, i).map(|k| opposite_cotangent(rest, i, j, k));

        let w = match (cot_alpha, cot_beta) {
            (Some(a), Some(b)) => 0.5 * (a + b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            // Neighbors always share a triangle, so at least one side exists
            (None, None) => 0.0,
        };

        weights.insert(EdgeKey::undirected(i, j), w);
    }

    EdgeWeights { weights }
}

/// Clamped cotangent of the angle at `k` in triangle `(i, j, k)`.
fn opposite_cotangent(rest: &[Point3<f64>], i: usize, j: usize, k: usize) -> f64 {
    let pk = rest[k];
    let (Some(ki), Some(kj)) = (
        (pk - rest[i]).try_normalize(DEGENERATE_LENGTH),
        (pk - rest[j]).try_normalize(DEGENERATE_LENGTH),
    ) else {
        warn!("corner {} of edge ({}, {}) is coincident with an endpoint", k, i, j);
        return 0.0;
    };

    let cosine = ki.dot(&kj);
    let sine = ki.cross(&kj).norm();
    if sine < DEGENERATE_SINE {
        warn!("corner {} of edge ({}, {}) is flat", k, i, j);
        return 0.0;
    }

    (cosine / sine).max(0.0)
}
