//! Error types for arap-deform.
//!
//! Only malformed input is an error. Numerical trouble during a solve
//! (degenerate neighborhoods, unconstrained free regions) is reported through
//! [`StepOutcome`](crate::algo::deform::StepOutcome) and log diagnostics instead.

use thiserror::Error;

/// Result type alias using [`DeformError`].
pub type Result<T> = std::result::Result<T, DeformError>;

/// Errors that can occur while building or driving a deformation.
#[derive(Error, Debug)]
pub enum DeformError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices (degenerate triangle).
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A per-vertex buffer does not match the mesh's vertex count.
    #[error("{buffer} has {actual} entries but the mesh has {expected} vertices")]
    VertexCountMismatch {
        /// Which buffer was wrong.
        buffer: &'static str,
        /// Vertex count of the mesh.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// Sparse factorization could not be built.
    #[error("sparse factorization failed: {0}")]
    Factorization(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl DeformError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        DeformError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn check_len(buffer: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(DeformError::VertexCountMismatch {
                buffer,
                expected,
                actual,
            })
        }
    }
}
