//! Per-turn report types returned by `advance_turn`.
//!
//! These replace engine-side broadcast events: the caller receives one
//! [`TurnReport`] per resolved turn and renders from it.

use serde::{Deserialize, Serialize};

use crate::enums::Outcome;
use crate::ids::AgentId;
use crate::structs::{Cell, PopulationCounts};

/// Summary of one resolved turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    /// The day number that was just resolved (first turn is day 1).
    pub day: u64,
    /// Stocks at the end of the turn.
    pub counts: PopulationCounts,
    /// Terminal verdict reached by this turn, if any.
    pub outcome: Option<Outcome>,
    /// Variant-specific detail.
    pub detail: TurnDetail,
}

/// Variant-specific turn detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum TurnDetail {
    /// Discrete grid variant.
    Grid(GridTurn),
    /// Aggregate stock-and-flow variant.
    StockFlow(FlowTurn),
}

/// What the acting infected agents did during a grid turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridTurn {
    /// Agents selected to act, in shuffle order.
    pub acting: Vec<AgentId>,
    /// One-step moves, with the full path for animation.
    pub moves: Vec<AgentMove>,
    /// Bites that landed and were queued for incubation.
    pub bites: Vec<Bite>,
    /// Bites refused because the incubation conveyor was full.
    pub refused: Vec<Bite>,
    /// Incubating agents that finished converting this turn.
    pub conversions: Vec<Conversion>,
}

/// An infected agent stepping along its path toward a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMove {
    /// The moving agent.
    pub agent: AgentId,
    /// Cell before the move.
    pub from: Cell,
    /// Cell after the move (equal to `from` if the next cell was occupied).
    pub to: Cell,
    /// Shortest path from `from` to the target, both endpoints included.
    pub path: Vec<Cell>,
}

/// An infected agent biting a susceptible one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bite {
    /// The biting agent.
    pub attacker: AgentId,
    /// The bitten agent.
    pub victim: AgentId,
    /// Where the victim stands.
    pub cell: Cell,
}

/// An incubating agent retired and replaced by a new infected agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    /// The incubating agent that was retired.
    pub retired: AgentId,
    /// The infected agent spawned in its place.
    pub spawned: AgentId,
    /// The converted cell.
    pub cell: Cell,
}

/// Intermediate quantities of an aggregate turn.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowTurn {
    /// `(susceptible + bitten) / land_area`.
    pub density: f64,
    /// `density / normal_density`.
    pub density_ratio: f64,
    /// Density response curve output.
    pub effect: f64,
    /// Multiplier derived from the fenced edge fraction.
    pub containment_multiplier: f64,
    /// Bites per infected per turn.
    pub bite_rate: f64,
    /// Rounded total bites by all infected.
    pub total_bites: f64,
    /// Bites that landed on susceptible population.
    pub newly_bitten: f64,
    /// Amount the conveyor accepted.
    pub enqueued: f64,
    /// Bites the conveyor had no room for.
    pub dropped_bites: f64,
    /// Conveyor outflow converted to infected.
    pub outflow: f64,
}
