//! # arap-deform
//!
//! As-rigid-as-possible (ARAP) surface deformation for interactive mesh editing.
//!
//! The host supplies a rest-pose triangle mesh once and, every interaction
//! frame, a per-vertex classification into pinned, dragged and free vertices
//! together with the live position buffer. The solver rewrites the free
//! vertices in place so that each one-ring deforms as rigidly as possible.
//!
//! ## Features
//!
//! - **Cotangent Laplacian**: clamped cotangent edge weights built once per mesh
//! - **Local step**: per-vertex orthogonal Procrustes fit with reflection correction
//! - **Global step**: boundary-reduced sparse Cholesky solve, cached across frames
//! - **Graceful degradation**: degenerate neighborhoods fall back to the identity
//!   rotation; unconstrained or failed solves leave positions untouched
//!
//! ## Quick Start
//!
//! ```
//! use arap_deform::prelude::*;
//! use arap_deform::mesh::grid;
//! use nalgebra::Vector3;
//!
//! let mesh = grid(4, 4, 1.0);
//! let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
//!
//! let mut types = vec![VertexType::Calculated; mesh.num_vertices()];
//! types[0] = VertexType::Fixed;
//! types[4] = VertexType::Fixed;
//! types[24] = VertexType::Draggable;
//!
//! let mut positions = mesh.vertices().to_vec();
//! positions[24] += Vector3::new(0.0, 0.0, 1.5);
//!
//! // Once per frame or drag event
//! let outcome = solver.solve_step(&types, &mut positions).unwrap();
//! if outcome.positions_changed() {
//!     // re-upload `positions` to the GPU
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use arap_deform::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::deform::{
        ArapSolver, DeformOptions, DeformReport, SkipReason, StepOutcome, VertexType,
    };
    pub use crate::algo::Progress;
    pub use crate::error::{DeformError, Result};
    pub use crate::mesh::{Topology, TriangleMesh};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
