//! Shared type definitions for the Outbreak containment simulation.
//!
//! This crate is the single source of truth for the value types that flow
//! between the world, population, and core crates and out to whatever
//! renders the simulation.
//!
//! # Modules
//!
//! - [`ids`] -- Arena identifiers for agents
//! - [`enums`] -- Occupants, axes, directions, phases, outcomes
//! - [`structs`] -- Cells, edge references, counts, status view
//! - [`report`] -- Per-turn report payloads

pub mod enums;
pub mod ids;
pub mod report;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    AgentKind, Axis, Direction, FenceOutcome, ModelVariant, Occupant, Outcome, TurnPhase,
};
pub use ids::AgentId;
pub use report::{AgentMove, Bite, Conversion, FlowTurn, GridTurn, TurnDetail, TurnReport};
pub use structs::{Cell, EdgeRef, Placement, PopulationCounts, StatusView};
