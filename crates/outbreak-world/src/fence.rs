//! Fence layer: one boolean per grid edge.
//!
//! A `W x H` grid has `W * (H + 1)` horizontal edges and `(W + 1) * H`
//! vertical edges, boundary edges included. Fences are monotonic: once an
//! edge is fenced it stays fenced for the rest of the run.
//!
//! Edges can also be addressed by a flat id, horizontal edges first, which is
//! how the input layer numbers the clickable edge pieces.

use outbreak_types::{Axis, EdgeRef, FenceOutcome};

use crate::error::WorldError;

/// Fence flags for every edge of a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceLayer {
    /// Grid width in cells.
    width: u32,
    /// Grid height in cells.
    height: u32,
    /// Horizontal edge flags, row-major over `(x, y)` with `y` in `0..=height`.
    horizontal: Vec<bool>,
    /// Vertical edge flags, row-major over `(x, y)` with `x` in `0..=width`.
    vertical: Vec<bool>,
    /// Number of `true` flags across both arrays.
    fenced: u32,
}

impl FenceLayer {
    /// Create an unfenced layer for a `width x height` grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArithmeticOverflow`] if the edge count does not
    /// fit in `u32`.
    pub fn new(width: u32, height: u32) -> Result<Self, WorldError> {
        let horizontal_len = height
            .checked_add(1)
            .and_then(|rows| rows.checked_mul(width))
            .ok_or(WorldError::ArithmeticOverflow)?;
        let vertical_len = width
            .checked_add(1)
            .and_then(|cols| cols.checked_mul(height))
            .ok_or(WorldError::ArithmeticOverflow)?;
        horizontal_len
            .checked_add(vertical_len)
            .ok_or(WorldError::ArithmeticOverflow)?;

        Ok(Self {
            width,
            height,
            horizontal: vec![false; to_usize(horizontal_len)?],
            vertical: vec![false; to_usize(vertical_len)?],
            fenced: 0,
        })
    }

    /// Number of horizontal edges.
    pub fn horizontal_len(&self) -> u32 {
        u32::try_from(self.horizontal.len()).unwrap_or(u32::MAX)
    }

    /// Number of vertical edges.
    pub fn vertical_len(&self) -> u32 {
        u32::try_from(self.vertical.len()).unwrap_or(u32::MAX)
    }

    /// Total number of edges, boundary included.
    pub fn edge_count(&self) -> u32 {
        self.horizontal_len().saturating_add(self.vertical_len())
    }

    /// Number of fenced edges.
    pub const fn fenced_count(&self) -> u32 {
        self.fenced
    }

    /// Fraction of all edges that are fenced, in `[0, 1]`.
    pub fn fenced_fraction(&self) -> f64 {
        let total = self.edge_count();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.fenced) / f64::from(total)
    }

    /// Whether the reference names an edge of this layer.
    pub fn contains(&self, edge: EdgeRef) -> bool {
        self.flag(edge).is_some()
    }

    /// The fence flag for `edge`, or `None` if out of range.
    pub fn flag(&self, edge: EdgeRef) -> Option<bool> {
        let slot = usize::try_from(edge.index).ok()?;
        match edge.axis {
            Axis::Horizontal => self.horizontal.get(slot).copied(),
            Axis::Vertical => self.vertical.get(slot).copied(),
        }
    }

    /// Whether `edge` is fenced. Out-of-range edges report `false`.
    pub fn is_fenced(&self, edge: EdgeRef) -> bool {
        self.flag(edge).unwrap_or(false)
    }

    /// Fence `edge`. Idempotent; out-of-range references change nothing.
    pub fn place(&mut self, edge: EdgeRef) -> FenceOutcome {
        let Ok(slot) = usize::try_from(edge.index) else {
            return FenceOutcome::OutOfRange;
        };
        let flag = match edge.axis {
            Axis::Horizontal => self.horizontal.get_mut(slot),
            Axis::Vertical => self.vertical.get_mut(slot),
        };
        match flag {
            None => FenceOutcome::OutOfRange,
            Some(true) => FenceOutcome::AlreadyFenced,
            Some(flag) => {
                *flag = true;
                self.fenced = self.fenced.saturating_add(1);
                FenceOutcome::Placed
            }
        }
    }

    /// The horizontal edge at `(x, y)`: top boundary of cell `(x, y)`.
    /// `y == height` is the bottom boundary of the last row.
    pub fn horizontal_at(&self, x: u32, y: u32) -> Option<EdgeRef> {
        if x >= self.width || y > self.height {
            return None;
        }
        let index = y.checked_mul(self.width)?.checked_add(x)?;
        Some(EdgeRef::horizontal(index))
    }

    /// The vertical edge at `(x, y)`: left boundary of cell `(x, y)`.
    /// `x == width` is the right boundary of the last column.
    pub fn vertical_at(&self, x: u32, y: u32) -> Option<EdgeRef> {
        if x > self.width || y >= self.height {
            return None;
        }
        let stride = self.width.checked_add(1)?;
        let index = y.checked_mul(stride)?.checked_add(x)?;
        Some(EdgeRef::vertical(index))
    }

    /// Translate a flat edge id (horizontal edges first) to an edge reference.
    pub fn edge_from_id(&self, id: u32) -> Option<EdgeRef> {
        let split = self.horizontal_len();
        if id < split {
            return Some(EdgeRef::horizontal(id));
        }
        let index = id.checked_sub(split)?;
        (index < self.vertical_len()).then_some(EdgeRef::vertical(index))
    }

    /// The flat id of an edge reference, if it is in range.
    pub fn id_of(&self, edge: EdgeRef) -> Option<u32> {
        if !self.contains(edge) {
            return None;
        }
        match edge.axis {
            Axis::Horizontal => Some(edge.index),
            Axis::Vertical => self.horizontal_len().checked_add(edge.index),
        }
    }

    /// All fenced edges, horizontal first, in index order.
    pub fn fenced_edges(&self) -> Vec<EdgeRef> {
        let horizontal = self
            .horizontal
            .iter()
            .zip(0_u32..)
            .filter(|&(&flag, _)| flag)
            .map(|(_, index)| EdgeRef::horizontal(index));
        let vertical = self
            .vertical
            .iter()
            .zip(0_u32..)
            .filter(|&(&flag, _)| flag)
            .map(|(_, index)| EdgeRef::vertical(index));
        horizontal.chain(vertical).collect()
    }
}

fn to_usize(value: u32) -> Result<usize, WorldError> {
    usize::try_from(value).map_err(|_err| WorldError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_counts_include_boundary() {
        let layer = FenceLayer::new(10, 10).ok();
        let layer = layer.as_ref();
        assert_eq!(layer.map(FenceLayer::horizontal_len), Some(110));
        assert_eq!(layer.map(FenceLayer::vertical_len), Some(110));
        assert_eq!(layer.map(FenceLayer::edge_count), Some(220));
    }

    #[test]
    fn place_is_idempotent_and_monotonic() {
        let Ok(mut layer) = FenceLayer::new(3, 2) else {
            return;
        };
        let edge = EdgeRef::vertical(4);
        assert_eq!(layer.place(edge), FenceOutcome::Placed);
        assert_eq!(layer.place(edge), FenceOutcome::AlreadyFenced);
        assert!(layer.is_fenced(edge));
        assert_eq!(layer.fenced_count(), 1);
    }

    #[test]
    fn out_of_range_edge_is_noop() {
        let Ok(mut layer) = FenceLayer::new(3, 2) else {
            return;
        };
        assert_eq!(layer.place(EdgeRef::horizontal(9)), FenceOutcome::OutOfRange);
        assert_eq!(layer.place(EdgeRef::vertical(8)), FenceOutcome::OutOfRange);
        assert_eq!(layer.fenced_count(), 0);
        assert!(!layer.is_fenced(EdgeRef::horizontal(9)));
    }

    #[test]
    fn flat_ids_put_horizontal_edges_first() {
        let Ok(layer) = FenceLayer::new(3, 2) else {
            return;
        };
        // 3 * 3 = 9 horizontal edges, 4 * 2 = 8 vertical edges.
        assert_eq!(layer.edge_from_id(0), Some(EdgeRef::horizontal(0)));
        assert_eq!(layer.edge_from_id(8), Some(EdgeRef::horizontal(8)));
        assert_eq!(layer.edge_from_id(9), Some(EdgeRef::vertical(0)));
        assert_eq!(layer.edge_from_id(16), Some(EdgeRef::vertical(7)));
        assert_eq!(layer.edge_from_id(17), None);
        assert_eq!(layer.id_of(EdgeRef::vertical(7)), Some(16));
        assert_eq!(layer.id_of(EdgeRef::vertical(8)), None);
    }

    #[test]
    fn coordinates_map_to_indices() {
        let Ok(layer) = FenceLayer::new(3, 2) else {
            return;
        };
        assert_eq!(layer.horizontal_at(2, 2), Some(EdgeRef::horizontal(8)));
        assert_eq!(layer.horizontal_at(3, 0), None);
        assert_eq!(layer.vertical_at(3, 1), Some(EdgeRef::vertical(7)));
        assert_eq!(layer.vertical_at(0, 2), None);
    }

    #[test]
    fn fraction_tracks_fenced_share() {
        let Ok(mut layer) = FenceLayer::new(1, 1) else {
            return;
        };
        assert_eq!(layer.edge_count(), 4);
        let _ = layer.place(EdgeRef::horizontal(0));
        assert!((layer.fenced_fraction() - 0.25).abs() < f64::EPSILON);
        assert_eq!(layer.fenced_edges(), vec![EdgeRef::horizontal(0)]);
    }
}
