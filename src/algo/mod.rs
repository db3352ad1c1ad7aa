//! Mesh deformation algorithms.
//!
//! - [`deform`]: As-rigid-as-possible deformation driven by pinned and
//!   dragged vertices
//! - [`progress`]: Progress callbacks for iterative solves

pub mod deform;
pub mod progress;

pub use progress::Progress;
