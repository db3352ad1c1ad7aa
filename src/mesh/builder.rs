//! Mesh construction utilities.
//!
//! The deformation engine consumes plain face-vertex buffers: an ordered list
//! of rest-pose positions and a list of triangles. [`TriangleMesh`] validates
//! those buffers once at load time so the per-frame code can index freely.

use nalgebra::Point3;

use super::edge::MAX_VERTEX_ID;
use crate::error::{DeformError, Result};

/// An immutable rest-pose triangle mesh.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    vertices: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Build a mesh from vertices and triangle faces.
    ///
    /// # Arguments
    /// * `vertices` - Rest-pose vertex positions
    /// * `faces` - List of triangle faces, each as [v0, v1, v2] indices
    ///
    /// # Returns
    /// The validated mesh, or an error if the input is invalid.
    ///
    /// # Example
    /// ```
    /// use arap_deform::mesh::TriangleMesh;
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.5, 1.0, 0.0),
    /// ];
    /// let faces = vec![[0, 1, 2]];
    ///
    /// let mesh = TriangleMesh::new(vertices, faces).unwrap();
    /// assert_eq!(mesh.num_vertices(), 3);
    /// assert_eq!(mesh.num_faces(), 1);
    /// ```
    pub fn new(vertices: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Result<Self> {
        if faces.is_empty() {
            return Err(DeformError::EmptyMesh);
        }
        if vertices.len() > MAX_VERTEX_ID {
            return Err(DeformError::invalid_param(
                "vertices",
                vertices.len(),
                "vertex ids must fit in 32 bits",
            ));
        }

        for (fi, face) in faces.iter().enumerate() {
            for &vi in face {
                if vi >= vertices.len() {
                    return Err(DeformError::InvalidVertexIndex { face: fi, vertex: vi });
                }
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(DeformError::DegenerateFace { face: fi });
            }
        }

        Ok(Self { vertices, faces })
    }

    /// Rest-pose vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Triangle index list.
    #[inline]
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Compute the axis-aligned bounding box of the rest pose.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &self.vertices[1..] {
            min = min.inf(p);
            max = max.sup(p);
        }
        Some((min, max))
    }
}

/// Build a planar grid in the XY plane.
///
/// The grid has `(nx + 1) * (ny + 1)` vertices laid out row by row
/// (`id = j * (nx + 1) + i`) and two triangles per cell, both wound
/// counter-clockwise.
///
/// # Example
/// ```
/// use arap_deform::mesh::grid;
///
/// let mesh = grid(2, 3, 1.0);
/// assert_eq!(mesh.num_vertices(), 12);
/// assert_eq!(mesh.num_faces(), 12);
/// ```
///
/// # Panics
/// Panics if `nx` or `ny` is zero.
pub fn grid(nx: usize, ny: usize, spacing: f64) -> TriangleMesh {
    assert!(nx > 0 && ny > 0, "grid needs at least one cell in each direction");

    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    let mut faces = Vec::with_capacity(nx * ny * 2);

    for j in 0..=ny {
        for i in 0..=nx {
            vertices.push(Point3::new(i as f64 * spacing, j as f64 * spacing, 0.0));
        }
    }

    for j in 0..ny {
        for i in 0..nx {
            let v00 = j * (nx + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (nx + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    TriangleMesh { vertices, faces }
}
