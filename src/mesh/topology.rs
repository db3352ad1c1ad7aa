//! Adjacency tables derived from the face list.
//!
//! Two tables are built once per mesh and cached by the solver:
//!
//! - [`NeighborTable`]: symmetric one-ring adjacency, indexed by vertex id.
//! - [`OppositeVertexTable`]: for each directed edge `i -> j` of a triangle,
//!   the third vertex of that triangle.
//!
//! Both are approximate on non-manifold input. An edge shared by more than two
//! triangles keeps the opposite vertex of the last triangle that listed it in a
//! given direction.

use std::collections::HashMap;

use super::builder::TriangleMesh;
use super::edge::EdgeKey;

/// Symmetric vertex adjacency.
///
/// Neighbor lists are sorted and free of duplicates and self-loops. Vertices
/// that are not referenced by any face have an empty list.
#[derive(Debug, Clone)]
pub struct NeighborTable {
    neighbors: Vec<Vec<usize>>,
}

impl NeighborTable {
    /// Build the neighbor table from a triangle list.
    ///
    /// For each triangle `(a, b, c)` every pair among `{a, b, c}` becomes
    /// mutual neighbors.
    pub fn build(faces: &[[usize; 3]], num_vertices: usize) -> Self {
        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); num_vertices];

        for &[a, b, c] in faces {
            for (v, n0, n1) in [(a, b, c), (b, c, a), (c, a, b)] {
                neighbors[v].push(n0);
                neighbors[v].push(n1);
            }
        }

        for (v, list) in neighbors.iter_mut().enumerate() {
            list.sort_unstable();
            list.dedup();
            list.retain(|&n| n != v);
        }

        Self { neighbors }
    }

    /// Neighbors of vertex `v`.
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.neighbors[v]
    }

    /// Whether vertex `v` is referenced by at least one face.
    #[inline]
    pub fn contains_vertex(&self, v: usize) -> bool {
        !self.neighbors[v].is_empty()
    }

    /// Whether `a` and `b` share an edge.
    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.neighbors[a].binary_search(&b).is_ok()
    }

    /// Number of vertex slots (equal to the mesh vertex count).
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Iterate over undirected edges `(i, j)` with `i < j`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbors.iter().enumerate().flat_map(|(i, list)| {
            list.iter().copied().filter(move |&j| i < j).map(move |j| (i, j))
        })
    }
}

/// Directed edge to opposite vertex map.
#[derive(Debug, Clone, Default)]
pub struct OppositeVertexTable {
    opposite: HashMap<EdgeKey, usize>,
}

impl OppositeVertexTable {
    /// Build the opposite-vertex table from a triangle list.
    ///
    /// For each triangle `(a, b, c)`: `c` is opposite `a -> b`, `a` is opposite
    /// `b -> c` and `b` is opposite `c -> a`.
    pub fn build(faces: &[[usize; 3]]) -> Self {
        let mut opposite = HashMap::with_capacity(faces.len() * 3);

        for &[a, b, c] in faces {
            opposite.insert(EdgeKey::directed(a, b), c);
            opposite.insert(EdgeKey::directed(b, c), a);
            opposite.insert(EdgeKey::directed(c, a), b);
        }

        Self { opposite }
    }

    /// The vertex opposite the directed edge `from -> to`, if any triangle has it.
    #[inline]
    pub fn get(&self, from: usize, to: usize) -> Option<usize> {
        self.opposite.get(&EdgeKey::directed(from, to)).copied()
    }

    /// Whether `{a, b}` is a boundary edge (only one direction is present).
    pub fn is_boundary_edge(&self, a: usize, b: usize) -> bool {
        self.get(a, b).is_some() != self.get(b, a).is_some()
    }

    /// Number of directed edges recorded.
    #[inline]
    pub fn len(&self) -> usize {
        self.opposite.len()
    }

    /// Whether the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.opposite.is_empty()
    }
}

/// Combined topology of a mesh.
#[derive(Debug, Clone)]
pub struct Topology {
    /// One-ring adjacency.
    pub neighbors: NeighborTable,
    /// Opposite vertex per directed edge.
    pub opposite: OppositeVertexTable,
}

impl Topology {
    /// Build both tables for a mesh.
    pub fn build(mesh: &TriangleMesh) -> Self {
        Self {
            neighbors: NeighborTable::build(mesh.faces(), mesh.num_vertices()),
            opposite: OppositeVertexTable::build(mesh.faces()),
        }
    }
}
