//! Local step: best-fit rotation per vertex.
//!
//! For each vertex `i` the weighted covariance of its rest and current one-ring
//! edge vectors,
//!
//! ```text
//! S_i = sum_j w_ij (p_j - p_i) (p'_j - p'_i)^T
//! ```
//!
//! is decomposed as `S_i = U Σ V^T` and the rotation is `R_i = V U^T`
//! (orthogonal Procrustes). Reflections are corrected by flipping the column of
//! `U` paired with the smallest singular value. A fit that still fails is
//! replaced by the identity and counted as a fallback.

use log::warn;
use nalgebra::{Matrix3, Point3};

use crate::mesh::NeighborTable;

use super::weights::EdgeWeights;

/// Accepted deviation of `det(R)` from 1.
const DETERMINANT_TOLERANCE: f64 = 1e-4;

/// Iteration cap handed to the SVD.
const SVD_MAX_ITERATIONS: usize = 200;

/// One rotation per vertex, rebuilt on every solve.
#[derive(Debug, Clone)]
pub struct RotationSet {
    rotations: Vec<Matrix3<f64>>,
    fallbacks: usize,
}

impl RotationSet {
    /// Rotation of vertex `i`.
    #[inline]
    pub fn get(&self, i: usize) -> &Matrix3<f64> {
        &self.rotations[i]
    }

    /// Number of rotations.
    #[inline]
    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }

    /// Number of vertices whose fit failed and were given the identity.
    #[inline]
    pub fn fallback_count(&self) -> usize {
        self.fallbacks
    }

    /// All rotations, indexed by vertex id.
    #[inline]
    pub fn as_slice(&self) -> &[Matrix3<f64>] {
        &self.rotations
    }
}

/// Compute the best-fit rotation of every vertex.
///
/// # Arguments
///
/// * `rest` - Rest-pose positions `p`
/// * `current` - Current positions `p'`
/// * `neighbors` - One-ring adjacency
/// * `weights` - Cotangent edge weights
/// * `regularization` - Relative diagonal shift `ε` added to each covariance
pub fn compute_rotations(
    rest: &[Point3<f64>],
    current: &[Point3<f64>],
    neighbors: &NeighborTable,
    weights: &EdgeWeights,
    regularization: f64,
) -> RotationSet {
    let mut rotations = Vec::with_capacity(rest.len());
    let mut fallbacks = 0;

    for i in 0..rest.len() {
        let covariance = vertex_covariance(i, rest, current, neighbors, weights);
        match fit_rotation(&covariance, regularization) {
            Some(r) => rotations.push(r),
            None => {
                warn!("vertex {}: rotation fit failed, using identity", i);
                fallbacks += 1;
                rotations.push(Matrix3::identity());
            }
        }
    }

    RotationSet {
        rotations,
        fallbacks,
    }
}

/// Weighted covariance of rest vs. current edge vectors around vertex `i`.
fn vertex_covariance(
    i: usize,
    rest: &[Point3<f64>],
    current: &[Point3<f64>],
    neighbors: &NeighborTable,
    weights: &EdgeWeights,
) -> Matrix3<f64> {
    let mut s = Matrix3::zeros();
    for &j in neighbors.neighbors(i) {
        let w = weights.weight(i, j);
        let e = rest[j] - rest[i];
        let e_prime = current[j] - current[i];
        s += w * e * e_prime.transpose();
    }
    s
}

/// Closest proper rotation to a covariance matrix.
///
/// Returns `None` when the decomposition fails or produces something that is
/// not a rotation. A zero covariance carries no orientation and yields the
/// identity.
pub fn fit_rotation(covariance: &Matrix3<f64>, regularization: f64) -> Option<Matrix3<f64>> {
    if covariance.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let scale = covariance.amax();
    if scale == 0.0 {
        return Some(Matrix3::identity());
    }

    let s = covariance + Matrix3::identity() * (regularization * scale);
    let svd = s.try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)?;
    let mut u = svd.u?;
    let v = svd.v_t?.transpose();

    // Ensure proper rotation (det = 1, not -1)
    if u.determinant() * v.determinant() < 0.0 {
        let k = svd.singular_values.imin();
        for row in 0..3 {
            u[(row, k)] = -u[(row, k)];
        }
    }

    let r = v * u.transpose();
    let det = r.determinant();
    if !det.is_finite() || (det - 1.0).abs() > DETERMINANT_TOLERANCE {
        return None;
    }

    Some(r)
}
