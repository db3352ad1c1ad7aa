//! Packed edge keys.
//!
//! Edges are identified by a pair of vertex ids packed into a single `u64`
//! (source in the high 32 bits, target in the low 32 bits). This gives
//! allocation-free hashing and O(1) lookup for both directed and undirected
//! edge tables.

use std::fmt::{self, Debug};

/// Largest vertex id that fits in an [`EdgeKey`].
pub const MAX_VERTEX_ID: usize = u32::MAX as usize;

/// A packed vertex pair identifying an edge.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeKey(u64);

impl EdgeKey {
    /// Key for the directed edge `from -> to`.
    #[inline]
    pub fn directed(from: usize, to: usize) -> Self {
        debug_assert!(from <= MAX_VERTEX_ID, "vertex id {} too large for an edge key", from);
        debug_assert!(to <= MAX_VERTEX_ID, "vertex id {} too large for an edge key", to);
        Self(((from as u64) << 32) | to as u64)
    }

    /// Key for the undirected edge `{a, b}`; the smaller id comes first.
    #[inline]
    pub fn undirected(a: usize, b: usize) -> Self {
        if a < b {
            Self::directed(a, b)
        } else {
            Self::directed(b, a)
        }
    }

    /// The `(from, to)` vertex ids of this key.
    #[inline]
    pub fn endpoints(self) -> (usize, usize) {
        ((self.0 >> 32) as usize, (self.0 & 0xFFFF_FFFF) as usize)
    }

    /// The same edge traversed in the opposite direction.
    #[inline]
    pub fn reversed(self) -> Self {
        let (from, to) = self.endpoints();
        Self::directed(to, from)
    }

    /// Get the raw packed value.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Debug for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (from, to) = self.endpoints();
        write!(f, "E({}->{})", from, to)
    }
}
