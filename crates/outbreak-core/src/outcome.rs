//! Win/loss evaluation.
//!
//! Checked once at the end of every turn:
//!
//! - **Lost**: no susceptible population remains. Checked first.
//! - **Contained**: the incubation conveyor is empty and either no infected
//!   population remains or (grid variant) no infected agent can reach any
//!   remaining susceptible agent.
//!
//! A non-empty conveyor always blocks containment: population that is
//! already incubating will still convert into new infected.
//!
//! With a conserved, non-zero population the two triggers cannot hold at
//! once. If they do, the evaluator logs the modeling anomaly and reports
//! [`Outcome::Lost`].

use outbreak_types::Outcome;
use tracing::error;

/// End-of-turn state the evaluator looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeInputs {
    /// The day that just resolved.
    pub day: u64,
    /// Susceptible population (agents or stock).
    pub susceptible: f64,
    /// Infected population (agents or stock).
    pub infected: f64,
    /// Whether the incubation conveyor is empty.
    pub conveyor_empty: bool,
    /// Grid variant: whether any infected agent can reach any susceptible
    /// agent. `None` for the aggregate variant, which has no geometry.
    pub infected_can_reach: Option<bool>,
}

/// Stateless terminal-condition check.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinLossEvaluator;

impl WinLossEvaluator {
    /// Whether `inputs` describe a lost simulation.
    pub fn is_lost(inputs: &OutcomeInputs) -> bool {
        inputs.susceptible <= 0.0
    }

    /// Whether `inputs` describe a contained outbreak.
    pub fn is_contained(inputs: &OutcomeInputs) -> bool {
        if !inputs.conveyor_empty {
            return false;
        }
        if inputs.infected <= 0.0 {
            return true;
        }
        inputs.susceptible > 0.0 && inputs.infected_can_reach == Some(false)
    }

    /// The terminal outcome reached, if any.
    pub fn evaluate(inputs: &OutcomeInputs) -> Option<Outcome> {
        let lost = Self::is_lost(inputs);
        let contained = Self::is_contained(inputs);

        if lost && contained {
            error!(
                day = inputs.day,
                susceptible = inputs.susceptible,
                infected = inputs.infected,
                "MODEL_ANOMALY: both loss and containment triggers hold; reporting loss"
            );
        }

        if lost {
            Some(Outcome::Lost)
        } else if contained {
            Some(Outcome::Contained)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(susceptible: f64, infected: f64, conveyor_empty: bool, reach: Option<bool>) -> OutcomeInputs {
        OutcomeInputs {
            day: 1,
            susceptible,
            infected,
            conveyor_empty,
            infected_can_reach: reach,
        }
    }

    #[test]
    fn no_susceptible_is_lost() {
        assert_eq!(
            WinLossEvaluator::evaluate(&inputs(0.0, 5.0, true, Some(false))),
            Some(Outcome::Lost)
        );
        assert_eq!(
            WinLossEvaluator::evaluate(&inputs(0.0, 5.0, false, None)),
            Some(Outcome::Lost)
        );
    }

    #[test]
    fn no_infected_and_empty_conveyor_is_contained() {
        assert_eq!(
            WinLossEvaluator::evaluate(&inputs(10.0, 0.0, true, None)),
            Some(Outcome::Contained)
        );
    }

    #[test]
    fn pending_incubation_blocks_containment() {
        assert_eq!(WinLossEvaluator::evaluate(&inputs(10.0, 0.0, false, None)), None);
        assert_eq!(
            WinLossEvaluator::evaluate(&inputs(10.0, 2.0, false, Some(false))),
            None
        );
    }

    #[test]
    fn unreachable_susceptible_is_contained_on_grid_only() {
        assert_eq!(
            WinLossEvaluator::evaluate(&inputs(10.0, 2.0, true, Some(false))),
            Some(Outcome::Contained)
        );
        assert_eq!(WinLossEvaluator::evaluate(&inputs(10.0, 2.0, true, Some(true))), None);
        assert_eq!(WinLossEvaluator::evaluate(&inputs(10.0, 2.0, true, None)), None);
    }

    #[test]
    fn empty_world_reports_lost() {
        assert_eq!(
            WinLossEvaluator::evaluate(&inputs(0.0, 0.0, true, None)),
            Some(Outcome::Lost)
        );
    }
}
