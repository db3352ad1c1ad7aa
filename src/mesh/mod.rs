//! Mesh input and topology.
//!
//! This module provides the rest-pose mesh representation consumed by the
//! deformation engine and the adjacency tables derived from it.
//!
//! # Overview
//!
//! - [`TriangleMesh`] holds validated face-vertex buffers. The host owns the
//!   geometry; the engine only reads it.
//! - [`Topology`] bundles the [`NeighborTable`] and [`OppositeVertexTable`],
//!   built once per mesh.
//! - [`EdgeKey`] packs a vertex pair into a `u64` for allocation-free edge maps.
//!
//! # Construction
//!
//! ```
//! use arap_deform::mesh::{TriangleMesh, Topology};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh = TriangleMesh::new(vertices, faces).unwrap();
//! let topology = Topology::build(&mesh);
//! assert_eq!(topology.neighbors.neighbors(0), &[1, 2]);
//! ```

mod builder;
mod edge;
mod topology;

pub use builder::{grid, TriangleMesh};
pub use edge::{EdgeKey, MAX_VERTEX_ID};
pub use topology::{NeighborTable, OppositeVertexTable, Topology};
