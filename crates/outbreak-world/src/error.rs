//! Error types for the `outbreak-world` crate.
//!
//! Fallible grid operations return [`WorldError`]. Queries that can simply
//! answer "no" (pathfinding, fence placement on a bad edge) do not error.

use outbreak_types::Cell;

/// Errors that can occur during grid operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The grid must be at least 1x1 and its edge arrays must fit in `u32`.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A cell coordinate lies outside the grid.
    #[error("cell {0} is outside the grid")]
    CellOutOfRange(Cell),

    /// Arithmetic overflow during an index computation.
    #[error("arithmetic overflow in grid calculation")]
    ArithmeticOverflow,
}
