//! Grid topology: cell occupancy plus the fence layer.
//!
//! The [`GridTopology`] is the spatial backbone of the simulation. It owns
//! one [`Occupant`] tag per cell and a [`FenceLayer`] over the cell edges,
//! and answers the structural questions the path finder and turn engine
//! ask: is this cell on the grid, which edge separates two cells, can an
//! agent step from here to there.
//!
//! Cells are stored row-major (`y` outer, `x` inner). Every scan that
//! produces a list of cells uses that order, so tie-breaks downstream are
//! reproducible.

use outbreak_types::{Cell, Direction, EdgeRef, FenceOutcome, Occupant};
use tracing::{debug, warn};

use crate::error::WorldError;
use crate::fence::FenceLayer;

/// A fixed-size cell grid with fences on its edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTopology {
    /// Width in cells.
    width: u32,
    /// Height in cells.
    height: u32,
    /// Row-major occupant tags.
    cells: Vec<Occupant>,
    /// Edge fence flags.
    fences: FenceLayer,
}

impl GridTopology {
    /// Create an empty, unfenced `width x height` grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if either dimension is zero
    /// or exceeds `i32::MAX`, or [`WorldError::ArithmeticOverflow`] if the
    /// cell or edge counts overflow.
    pub fn new(width: u32, height: u32) -> Result<Self, WorldError> {
        let signed_ok = i32::try_from(width).is_ok() && i32::try_from(height).is_ok();
        if width == 0 || height == 0 || !signed_ok {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        let cell_count = width
            .checked_mul(height)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(WorldError::ArithmeticOverflow)?;

        Ok(Self {
            width,
            height,
            cells: vec![Occupant::Empty; cell_count],
            fences: FenceLayer::new(width, height)?,
        })
    }

    // -------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------

    /// Width in cells.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Bounds check on raw coordinates.
    pub fn is_valid_cell(&self, x: i32, y: i32) -> bool {
        let x_ok = u32::try_from(x).is_ok_and(|x| x < self.width);
        let y_ok = u32::try_from(y).is_ok_and(|y| y < self.height);
        x_ok && y_ok
    }

    /// Bounds check on a cell.
    pub fn contains(&self, cell: Cell) -> bool {
        self.is_valid_cell(cell.x, cell.y)
    }

    /// Row-major slot of a valid cell.
    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let x = usize::try_from(cell.x).ok()?;
        let y = usize::try_from(cell.y).ok()?;
        let width = usize::try_from(self.width).ok()?;
        y.checked_mul(width)?.checked_add(x)
    }

    /// The cell at a row-major slot.
    pub fn cell_at(&self, index: usize) -> Option<Cell> {
        if index >= self.cells.len() {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let x = i32::try_from(index.checked_rem(width)?).ok()?;
        let y = i32::try_from(index.checked_div(width)?).ok()?;
        Some(Cell::new(x, y))
    }

    /// Every cell in row-major order.
    pub fn all_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.cells.len()).filter_map(|index| self.cell_at(index))
    }

    // -------------------------------------------------------------------
    // Edges and fences
    // -------------------------------------------------------------------

    /// Read-only access to the fence layer.
    pub const fn fences(&self) -> &FenceLayer {
        &self.fences
    }

    /// The edge on the `direction` side of `cell`. Boundary edges included.
    pub fn edge_of(&self, cell: Cell, direction: Direction) -> Option<EdgeRef> {
        if !self.contains(cell) {
            return None;
        }
        let x = u32::try_from(cell.x).ok()?;
        let y = u32::try_from(cell.y).ok()?;
        match direction {
            Direction::West => self.fences.vertical_at(x, y),
            Direction::East => self.fences.vertical_at(x.checked_add(1)?, y),
            Direction::North => self.fences.horizontal_at(x, y),
            Direction::South => self.fences.horizontal_at(x, y.checked_add(1)?),
        }
    }

    /// The edge shared by two 4-adjacent valid cells.
    pub fn edge_between(&self, a: Cell, b: Cell) -> Option<EdgeRef> {
        if !self.contains(a) || !self.contains(b) || !a.is_adjacent(b) {
            return None;
        }
        let direction = if b.x < a.x {
            Direction::West
        } else if b.x > a.x {
            Direction::East
        } else if b.y < a.y {
            Direction::North
        } else {
            Direction::South
        };
        self.edge_of(a, direction)
    }

    /// Fence an edge. Idempotent. Out-of-range references are a no-op
    /// reported as [`FenceOutcome::OutOfRange`].
    ///
    /// Callers that derive a containment multiplier from the fenced fraction
    /// must recompute it after a [`FenceOutcome::Placed`].
    pub fn place_fence(&mut self, edge: EdgeRef) -> FenceOutcome {
        let outcome = self.fences.place(edge);
        match outcome {
            FenceOutcome::Placed => debug!(%edge, fenced = self.fences.fenced_count(), "Fence placed"),
            FenceOutcome::AlreadyFenced => debug!(%edge, "Edge already fenced"),
            FenceOutcome::OutOfRange => warn!(%edge, "Fence placement ignored: edge out of range"),
        }
        outcome
    }

    /// Fence an edge addressed by flat id (horizontal edges first).
    pub fn place_fence_by_id(&mut self, id: u32) -> FenceOutcome {
        match self.fences.edge_from_id(id) {
            Some(edge) => self.place_fence(edge),
            None => {
                warn!(edge_id = id, "Fence placement ignored: edge id out of range");
                FenceOutcome::OutOfRange
            }
        }
    }

    /// Fence the `direction` side of `cell`.
    pub fn place_fence_at(&mut self, cell: Cell, direction: Direction) -> FenceOutcome {
        match self.edge_of(cell, direction) {
            Some(edge) => self.place_fence(edge),
            None => {
                warn!(%cell, ?direction, "Fence placement ignored: cell out of range");
                FenceOutcome::OutOfRange
            }
        }
    }

    /// Whether `edge` is fenced.
    pub fn is_edge_fenced(&self, edge: EdgeRef) -> bool {
        self.fences.is_fenced(edge)
    }

    /// Whether travel between `a` and `b` is blocked. Non-adjacent or
    /// off-grid pairs are always blocked.
    pub fn is_blocked(&self, a: Cell, b: Cell) -> bool {
        self.edge_between(a, b)
            .is_none_or(|edge| self.fences.is_fenced(edge))
    }

    /// True iff `to` is on the grid, 4-adjacent to `from`, and the shared
    /// edge is not fenced.
    pub fn can_move(&self, from: Cell, to: Cell) -> bool {
        !self.is_blocked(from, to)
    }

    /// Cells reachable in one step from `cell`, in West, East, North, South
    /// order.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        Direction::ALL.into_iter().filter_map(move |direction| {
            let next = cell.step(direction)?;
            self.can_move(cell, next).then_some(next)
        })
    }

    /// Number of fenced edges.
    pub const fn fenced_count(&self) -> u32 {
        self.fences.fenced_count()
    }

    /// Total number of edges, boundary included.
    pub fn edge_count(&self) -> u32 {
        self.fences.edge_count()
    }

    /// Fraction of all edges that are fenced.
    pub fn fenced_fraction(&self) -> f64 {
        self.fences.fenced_fraction()
    }

    // -------------------------------------------------------------------
    // Occupancy
    // -------------------------------------------------------------------

    /// The occupant of `cell`, or `None` off-grid.
    pub fn occupant(&self, cell: Cell) -> Option<Occupant> {
        self.index_of(cell)
            .and_then(|index| self.cells.get(index))
            .copied()
    }

    /// Whether `cell` is on the grid and empty.
    pub fn is_empty_cell(&self, cell: Cell) -> bool {
        self.occupant(cell) == Some(Occupant::Empty)
    }

    /// Replace the occupant of `cell`, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CellOutOfRange`] for off-grid cells.
    pub fn set_occupant(&mut self, cell: Cell, occupant: Occupant) -> Result<Occupant, WorldError> {
        let slot = self
            .index_of(cell)
            .and_then(|index| self.cells.get_mut(index))
            .ok_or(WorldError::CellOutOfRange(cell))?;
        Ok(core::mem::replace(slot, occupant))
    }

    /// Cells holding `occupant`, row-major.
    pub fn cells_with(&self, occupant: Occupant) -> Vec<Cell> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &tag)| tag == occupant)
            .filter_map(|(index, _)| self.cell_at(index))
            .collect()
    }

    /// Number of cells holding `occupant`.
    pub fn count(&self, occupant: Occupant) -> usize {
        self.cells.iter().filter(|&&tag| tag == occupant).count()
    }

    /// Row-major occupant tags for rendering.
    pub fn occupancy(&self) -> &[Occupant] {
        &self.cells
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid(width: u32, height: u32) -> GridTopology {
        GridTopology::new(width, height).unwrap()
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(GridTopology::new(0, 5).is_err());
        assert!(GridTopology::new(5, 0).is_err());
    }

    #[test]
    fn bounds_check() {
        let g = grid(5, 4);
        assert!(g.is_valid_cell(0, 0));
        assert!(g.is_valid_cell(4, 3));
        assert!(!g.is_valid_cell(5, 0));
        assert!(!g.is_valid_cell(0, 4));
        assert!(!g.is_valid_cell(-1, 2));
    }

    #[test]
    fn index_roundtrip_is_row_major() {
        let g = grid(3, 2);
        assert_eq!(g.index_of(Cell::new(2, 1)), Some(5));
        assert_eq!(g.cell_at(4), Some(Cell::new(1, 1)));
        assert_eq!(g.cell_at(6), None);
        let order: Vec<Cell> = g.all_cells().take(4).collect();
        assert_eq!(
            order,
            vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0), Cell::new(0, 1)]
        );
    }

    #[test]
    fn edge_between_neighbors_matches_edge_of() {
        let g = grid(4, 4);
        let a = Cell::new(1, 1);
        assert_eq!(g.edge_between(a, Cell::new(2, 1)), g.edge_of(a, Direction::East));
        assert_eq!(g.edge_between(a, Cell::new(1, 0)), g.edge_of(a, Direction::North));
        assert_eq!(
            g.edge_between(Cell::new(2, 1), a),
            g.edge_of(a, Direction::East)
        );
        assert_eq!(g.edge_between(a, Cell::new(2, 2)), None);
        assert_eq!(g.edge_between(a, Cell::new(3, 1)), None);
    }

    #[test]
    fn fence_blocks_both_directions() {
        let mut g = grid(3, 3);
        let a = Cell::new(0, 0);
        let b = Cell::new(1, 0);
        assert!(g.can_move(a, b));
        assert_eq!(g.place_fence_at(a, Direction::East), FenceOutcome::Placed);
        assert!(!g.can_move(a, b));
        assert!(!g.can_move(b, a));
        assert!(g.can_move(a, Cell::new(0, 1)));
    }

    #[test]
    fn diagonal_and_offgrid_moves_illegal() {
        let g = grid(3, 3);
        assert!(!g.can_move(Cell::new(0, 0), Cell::new(1, 1)));
        assert!(!g.can_move(Cell::new(0, 0), Cell::new(-1, 0)));
        assert!(!g.can_move(Cell::new(2, 2), Cell::new(3, 2)));
    }

    #[test]
    fn neighbors_in_fixed_order() {
        let g = grid(3, 3);
        let around: Vec<Cell> = g.neighbors(Cell::new(1, 1)).collect();
        assert_eq!(
            around,
            vec![Cell::new(0, 1), Cell::new(2, 1), Cell::new(1, 0), Cell::new(1, 2)]
        );
        let corner: Vec<Cell> = g.neighbors(Cell::new(0, 0)).collect();
        assert_eq!(corner, vec![Cell::new(1, 0), Cell::new(0, 1)]);
    }

    #[test]
    fn boundary_fence_counts_but_does_not_block_interior() {
        let mut g = grid(2, 2);
        assert_eq!(g.place_fence_at(Cell::new(0, 0), Direction::West), FenceOutcome::Placed);
        assert!(g.fenced_fraction() > 0.0);
        assert!(g.can_move(Cell::new(0, 0), Cell::new(1, 0)));
    }

    #[test]
    fn fence_by_id_and_out_of_range() {
        let mut g = grid(2, 2);
        // 2 * 3 = 6 horizontal edges; id 6 is vertical edge 0.
        assert_eq!(g.place_fence_by_id(6), FenceOutcome::Placed);
        assert!(g.is_edge_fenced(EdgeRef::vertical(0)));
        assert_eq!(g.place_fence_by_id(12), FenceOutcome::OutOfRange);
        assert_eq!(
            g.place_fence_at(Cell::new(5, 5), Direction::North),
            FenceOutcome::OutOfRange
        );
    }

    #[test]
    fn occupancy_scan_is_row_major() {
        let mut g = grid(3, 3);
        let _ = g.set_occupant(Cell::new(2, 0), Occupant::Susceptible);
        let _ = g.set_occupant(Cell::new(0, 2), Occupant::Susceptible);
        let _ = g.set_occupant(Cell::new(1, 1), Occupant::Infected);
        assert_eq!(
            g.cells_with(Occupant::Susceptible),
            vec![Cell::new(2, 0), Cell::new(0, 2)]
        );
        assert_eq!(g.count(Occupant::Infected), 1);
        assert!(g.set_occupant(Cell::new(3, 0), Occupant::Infected).is_err());
        assert_eq!(g.occupant(Cell::new(1, 1)), Some(Occupant::Infected));
        assert!(g.is_empty_cell(Cell::new(0, 0)));
    }
}
