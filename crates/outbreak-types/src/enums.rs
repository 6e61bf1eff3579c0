//! Enumeration types for the Outbreak simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Grid occupancy
// ---------------------------------------------------------------------------

/// What currently occupies a grid cell.
///
/// `Incubating` is a bitten agent waiting on the incubation conveyor. It is
/// neither susceptible (cannot be bitten again) nor infected (does not act).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupant {
    /// Nobody is in the cell.
    #[default]
    Empty,
    /// A healthy agent that infected agents hunt.
    Susceptible,
    /// A bitten agent counting down to conversion.
    Incubating,
    /// An infected ("zombie") agent.
    Infected,
}

/// The population class of an agent record in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Healthy and targetable.
    Susceptible,
    /// Bitten, on the conveyor.
    Incubating,
    /// Infected and able to act.
    Infected,
}

impl AgentKind {
    /// The cell occupant tag that renders this kind.
    pub const fn occupant(self) -> Occupant {
        match self {
            Self::Susceptible => Occupant::Susceptible,
            Self::Incubating => Occupant::Incubating,
            Self::Infected => Occupant::Infected,
        }
    }
}

// ---------------------------------------------------------------------------
// Edges and directions
// ---------------------------------------------------------------------------

/// Orientation of a grid edge.
///
/// Horizontal edges separate vertically adjacent cells (a cell's top and
/// bottom boundaries); vertical edges separate horizontally adjacent cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// A boundary running along the x axis.
    Horizontal,
    /// A boundary running along the y axis.
    Vertical,
}

/// One of the four orthogonal grid directions. `North` is `y - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `x - 1`.
    West,
    /// `x + 1`.
    East,
    /// `y - 1`.
    North,
    /// `y + 1`.
    South,
}

impl Direction {
    /// Neighbor expansion order. BFS tie-breaks depend on it.
    pub const ALL: [Self; 4] = [Self::West, Self::East, Self::North, Self::South];

    /// The `(dx, dy)` step for this direction.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::West => (-1, 0),
            Self::East => (1, 0),
            Self::North => (0, -1),
            Self::South => (0, 1),
        }
    }
}

// ---------------------------------------------------------------------------
// Turn state machine
// ---------------------------------------------------------------------------

/// Terminal verdict of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The outbreak can no longer spread (win).
    Contained,
    /// No susceptible population remains (loss).
    Lost,
}

impl core::fmt::Display for Outcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Contained => f.write_str("outbreak contained"),
            Self::Lost => f.write_str("humanity lost"),
        }
    }
}

/// Where the turn state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Waiting for player commands or the next `advance_turn`.
    AwaitingPlayerAction,
    /// A turn is being resolved. Also left behind by a turn that failed.
    ResolvingTurn,
    /// The simulation ended. Absorbing.
    Terminal(Outcome),
}

impl TurnPhase {
    /// Whether the phase is terminal.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    /// The outcome, if terminal.
    pub const fn outcome(self) -> Option<Outcome> {
        match self {
            Self::Terminal(outcome) => Some(outcome),
            Self::AwaitingPlayerAction | Self::ResolvingTurn => None,
        }
    }
}

/// Which fidelity level of the model to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// Discrete agents on the grid, blocked structurally by fences.
    #[default]
    Grid,
    /// Aggregate stock-and-flow model damped by the containment multiplier.
    StockFlow,
}

/// Result of a fence placement command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FenceOutcome {
    /// The edge was open and is now fenced.
    Placed,
    /// The edge was already fenced; nothing changed.
    AlreadyFenced,
    /// The edge reference does not exist on this grid; nothing changed.
    OutOfRange,
}

impl FenceOutcome {
    /// Whether the command changed the fence layer.
    pub const fn changed(self) -> bool {
        matches!(self, Self::Placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_order_is_west_east_north_south() {
        let deltas: Vec<(i32, i32)> = Direction::ALL.iter().map(|d| d.delta()).collect();
        assert_eq!(deltas, vec![(-1, 0), (1, 0), (0, -1), (0, 1)]);
    }

    #[test]
    fn terminal_phase_exposes_outcome() {
        assert_eq!(
            TurnPhase::Terminal(Outcome::Lost).outcome(),
            Some(Outcome::Lost)
        );
        assert!(TurnPhase::Terminal(Outcome::Contained).is_terminal());
        assert!(!TurnPhase::ResolvingTurn.is_terminal());
        assert_eq!(TurnPhase::AwaitingPlayerAction.outcome(), None);
    }

    #[test]
    fn variant_serializes_snake_case() {
        let json = serde_json::to_string(&ModelVariant::StockFlow).ok();
        assert_eq!(json.as_deref(), Some("\"stock_flow\""));
    }

    #[test]
    fn kind_maps_to_occupant() {
        assert_eq!(AgentKind::Incubating.occupant(), Occupant::Incubating);
        assert_eq!(AgentKind::Infected.occupant(), Occupant::Infected);
    }
}
