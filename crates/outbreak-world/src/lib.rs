//! Spatial layer for the Outbreak simulation.
//!
//! This crate models the playing field: a fixed-size cell grid, a fence flag
//! on every cell edge (boundary edges included), and breadth-first
//! pathfinding that respects those fences.
//!
//! # Modules
//!
//! - [`error`] -- Error types for grid operations.
//! - [`fence`] -- [`FenceLayer`]: horizontal and vertical edge flags, flat
//!   edge ids, monotonic placement.
//! - [`grid`] -- [`GridTopology`]: occupancy, adjacency, edge lookup, and
//!   movement legality.
//! - [`pathfinding`] -- [`PathFinder`] and [`DistanceField`]: unit-cost BFS
//!   with a fixed neighbor order.

pub mod error;
pub mod fence;
pub mod grid;
pub mod pathfinding;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use fence::FenceLayer;
pub use grid::GridTopology;
pub use pathfinding::{DistanceField, PathFinder};
