//! Core value structs shared across the workspace.

use serde::{Deserialize, Serialize};

use crate::enums::{Axis, Direction, Outcome, TurnPhase};

/// A grid cell coordinate.
///
/// Coordinates are signed so that neighbor arithmetic can step off the grid;
/// validity against a concrete grid is checked by the topology, never assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column, `0..width` when valid.
    pub x: i32,
    /// Row, `0..height` when valid.
    pub y: i32,
}

impl Cell {
    /// Construct a cell coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The coordinate one step in `direction`, or `None` on integer overflow.
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (dx, dy) = direction.delta();
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }

    /// Manhattan distance, saturating.
    pub fn manhattan(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }

    /// Whether the two cells share an edge (diagonals do not).
    pub fn is_adjacent(self, other: Self) -> bool {
        self.manhattan(other) == 1
    }
}

impl core::fmt::Display for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Reference to one grid edge: an axis plus an index into that axis's
/// edge array.
///
/// For a `W x H` grid, horizontal edge `(x, y)` has index `y * W + x` with
/// `y` in `0..=H` and is the top boundary of cell `(x, y)`. Vertical edge
/// `(x, y)` has index `y * (W + 1) + x` with `x` in `0..=W` and is the left
/// boundary of cell `(x, y)`. Boundary edges face the exterior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeRef {
    /// Which edge array.
    pub axis: Axis,
    /// Index within that array.
    pub index: u32,
}

impl EdgeRef {
    /// A horizontal edge reference.
    pub const fn horizontal(index: u32) -> Self {
        Self {
            axis: Axis::Horizontal,
            index,
        }
    }

    /// A vertical edge reference.
    pub const fn vertical(index: u32) -> Self {
        Self {
            axis: Axis::Vertical,
            index,
        }
    }
}

impl core::fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.axis {
            Axis::Horizontal => write!(f, "h{}", self.index),
            Axis::Vertical => write!(f, "v{}", self.index),
        }
    }
}

/// Population counts for reporting. The grid variant reports whole agents;
/// the stock-and-flow variant reports continuous stocks.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PopulationCounts {
    /// Healthy population.
    pub susceptible: f64,
    /// Bitten population on the incubation conveyor.
    pub incubating: f64,
    /// Infected population.
    pub infected: f64,
}

impl PopulationCounts {
    /// Sum of all three stocks. Conserved across turns.
    pub fn total(&self) -> f64 {
        self.susceptible + self.incubating + self.infected
    }
}

/// Initial positions of the grid variant's population.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Cells that start with a susceptible agent.
    pub susceptible: Vec<Cell>,
    /// Cells that start with an infected agent.
    pub infected: Vec<Cell>,
}

/// Everything a presentation layer needs to draw the HUD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusView {
    /// Turns resolved so far.
    pub day: u64,
    /// Current stocks.
    pub counts: PopulationCounts,
    /// Share of all edges that are fenced, `0.0..=100.0`.
    pub containment_percent: f64,
    /// State machine phase.
    pub phase: TurnPhase,
    /// Terminal verdict, if any.
    pub outcome: Option<Outcome>,
}
