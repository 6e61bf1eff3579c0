//! Population conservation check.
//!
//! Nobody enters or leaves the simulation: a turn only moves population
//! between the susceptible, incubating, and infected stocks. For every turn
//! T the check is:
//!
//! ```text
//! |total(after T) - total(before T)| <= tolerance
//! ```
//!
//! Both engines maintain this by construction. The check runs after every
//! turn anyway and a violation produces a [`PopulationAnomaly`].

use outbreak_types::PopulationCounts;

use crate::PopulationAnomaly;

/// The result of a conservation check for a single turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ConservationResult {
    /// Totals match within tolerance.
    Balanced,
    /// The total drifted.
    Anomaly(PopulationAnomaly),
}

impl ConservationResult {
    /// Whether the turn balanced.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Compare stock totals before and after turn `turn`.
///
/// Non-finite totals are always an anomaly.
pub fn verify_conservation(
    turn: u64,
    before: &PopulationCounts,
    after: &PopulationCounts,
    tolerance: f64,
) -> ConservationResult {
    let total_before = before.total();
    let total_after = after.total();
    let drift = (total_after - total_before).abs();

    if drift.is_finite() && drift <= tolerance {
        return ConservationResult::Balanced;
    }

    ConservationResult::Anomaly(PopulationAnomaly {
        turn,
        total_before,
        total_after,
        message: format!(
            "POPULATION_ANOMALY at turn {turn}: total moved from {total_before} to {total_after}",
        ),
    })
}
