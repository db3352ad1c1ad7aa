//! As-rigid-as-possible surface deformation.
//!
//! Given a rest-pose mesh and a per-vertex classification into pinned,
//! user-dragged and free vertices, [`ArapSolver`] repositions the free vertices
//! so that every one-ring deforms as close to a rigid rotation as possible.
//!
//! Each solve alternates:
//! 1. **Local step**: fit a rotation per vertex from rest vs. current one-ring
//!    edges (weighted covariance, SVD, reflection correction)
//! 2. **Global step**: solve the cotangent Laplacian system restricted to the
//!    free vertices, with pinned and dragged vertices eliminated as boundary
//!    values
//!
//! Topology, cotangent weights and the Laplacian are built once per mesh. The
//! Cholesky factorization of the reduced system is cached and reused until the
//! set of free vertices changes.
//!
//! # Example
//!
//! ```
//! use arap_deform::algo::deform::{ArapSolver, DeformOptions, StepOutcome, VertexType};
//! use arap_deform::mesh::grid;
//! use nalgebra::Vector3;
//!
//! let mesh = grid(4, 1, 1.0);
//! let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
//!
//! // Pin the left edge, drag the right edge upwards, solve the rest
//! let mut types = vec![VertexType::Calculated; mesh.num_vertices()];
//! let mut positions = mesh.vertices().to_vec();
//! for (id, p) in mesh.vertices().iter().enumerate() {
//!     if p.x == 0.0 {
//!         types[id] = VertexType::Fixed;
//!     } else if p.x == 4.0 {
//!         types[id] = VertexType::Draggable;
//!         positions[id] += Vector3::new(0.0, 0.0, 1.0);
//!     }
//! }
//!
//! let outcome = solver.solve_step(&types, &mut positions).unwrap();
//! assert!(matches!(outcome, StepOutcome::Solved { .. }));
//! ```
//!
//! # References
//!
//! - Sorkine, O., & Alexa, M. (2007). "As-Rigid-As-Possible Surface Modeling."
//!   SGP 2007.

mod laplacian;
mod rotation;
mod solver;
mod sparse;
mod weights;

pub use laplacian::{build_laplacian, Laplacian};
pub use rotation::{compute_rotations, fit_rotation, RotationSet};
pub use solver::ArapSolver;
pub use sparse::{CholeskyFactor, CsrMatrix};
pub use weights::{build_weights, EdgeWeights};

use crate::error::{DeformError, Result};

/// Role of a vertex during a solve.
///
/// Fixed and Draggable positions are inputs written by the host; Calculated
/// positions are written by the solver. Reclassify only between solves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexType {
    /// Pinned in place.
    Fixed,
    /// Moved interactively by the host.
    Draggable,
    /// Free; positioned by the solver.
    #[default]
    Calculated,
}

impl VertexType {
    /// Whether the solver owns this vertex's position.
    #[inline]
    pub fn is_calculated(self) -> bool {
        self == VertexType::Calculated
    }
}

/// Options for ARAP deformation.
#[derive(Debug, Clone)]
pub struct DeformOptions {
    /// Relative diagonal shift added to each covariance before decomposition,
    /// scaled by the largest absolute covariance entry.
    pub regularization: f64,

    /// Maximum number of local/global iterations for [`ArapSolver::deform`].
    pub max_iterations: usize,

    /// [`ArapSolver::deform`] stops once no free vertex moves farther than this.
    pub tolerance: f64,
}

impl Default for DeformOptions {
    fn default() -> Self {
        Self {
            regularization: 1e-6,
            max_iterations: 10,
            tolerance: 1e-6,
        }
    }
}

impl DeformOptions {
    /// Set the covariance regularization factor.
    pub fn with_regularization(mut self, epsilon: f64) -> Self {
        self.regularization = epsilon;
        self
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Check that every option is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.regularization.is_finite() || self.regularization < 0.0 {
            return Err(DeformError::invalid_param(
                "regularization",
                self.regularization,
                "must be finite and non-negative",
            ));
        }
        if self.max_iterations == 0 {
            return Err(DeformError::invalid_param(
                "max_iterations",
                self.max_iterations,
                "must be at least 1",
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(DeformError::invalid_param(
                "tolerance",
                self.tolerance,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Why a solve left every position unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No vertex in any face is tagged Calculated.
    NoCalculatedVertices,
    /// A connected group of Calculated vertices has no Fixed or Draggable
    /// neighbor, so its positions are undetermined.
    Unconstrained,
    /// The factorization failed or the solution was not finite.
    SolveFailed,
}

/// Result of a single [`ArapSolver::solve_step`].
///
/// Any `Solved` outcome means the position buffer changed and the host must
/// re-upload it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Calculated vertices were rewritten.
    Solved {
        /// Number of vertices written.
        moved: usize,
        /// Largest distance any written vertex moved.
        max_displacement: f64,
        /// Vertices whose rotation fit failed and used the identity.
        rotation_fallbacks: usize,
        /// Whether the system had to be refactored for this call.
        refactored: bool,
    },
    /// Nothing was written.
    Skipped(SkipReason),
}

impl StepOutcome {
    /// Whether the host must treat the position buffer as changed.
    #[inline]
    pub fn positions_changed(&self) -> bool {
        matches!(self, StepOutcome::Solved { .. })
    }
}

/// Summary of an [`ArapSolver::deform`] run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeformReport {
    /// Number of solve steps that wrote positions.
    pub iterations: usize,
    /// Whether the last step moved less than the tolerance.
    pub converged: bool,
    /// Largest displacement of the last step.
    pub max_displacement: f64,
    /// Set when a step was skipped, which ends the run.
    pub skipped: Option<SkipReason>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_valid() {
        let options = DeformOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.regularization, 1e-6);
    }

    #[test]
    fn test_invalid_options() {
        assert!(DeformOptions::default().with_regularization(-1.0).validate().is_err());
        assert!(DeformOptions::default().with_regularization(f64::NAN).validate().is_err());
        assert!(DeformOptions::default().with_max_iterations(0).validate().is_err());
        assert!(DeformOptions::default().with_tolerance(f64::INFINITY).validate().is_err());

        match DeformOptions::default().with_tolerance(-0.5).validate() {
            Err(DeformError::InvalidParameter { name, .. }) => assert_eq!(name, "tolerance"),
            other => panic!("Expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_vertex_type() {
        assert!(VertexType::Calculated.is_calculated());
        assert!(!VertexType::Fixed.is_calculated());
        assert!(!VertexType::Draggable.is_calculated());
        assert_eq!(VertexType::default(), VertexType::Calculated);
    }

    #[test]
    fn test_outcome_positions_changed() {
        let solved = StepOutcome::Solved {
            moved: 1,
            max_displacement: 0.0,
            rotation_fallbacks: 0,
            refactored: false,
        };
        assert!(solved.positions_changed());
        assert!(!StepOutcome::Skipped(SkipReason::Unconstrained).positions_changed());
    }
}
