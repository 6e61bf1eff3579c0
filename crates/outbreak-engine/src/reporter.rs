//! Turn callback that logs the HUD after every turn.
//!
//! Headless runs have no screen, so the status line a front end would draw
//! is emitted as a structured log event instead.

use outbreak_core::runner::TurnCallback;
use outbreak_types::{StatusView, TurnDetail, TurnReport};
use tracing::{debug, info};

/// Logs one HUD line per turn and tracks the peak infected count.
#[derive(Debug, Default)]
pub struct HudReporter {
    peak_infected: f64,
}

impl HudReporter {
    /// Create a reporter with no turns seen.
    pub const fn new() -> Self {
        Self { peak_infected: 0.0 }
    }

    /// Largest infected count seen so far.
    pub const fn peak_infected(&self) -> f64 {
        self.peak_infected
    }
}

impl TurnCallback for HudReporter {
    fn on_turn(&mut self, report: &TurnReport, status: &StatusView) {
        self.peak_infected = self.peak_infected.max(status.counts.infected);

        info!(
            day = status.day,
            susceptible = status.counts.susceptible,
            incubating = status.counts.incubating,
            infected = status.counts.infected,
            containment_percent = status.containment_percent,
            "HUD"
        );

        match &report.detail {
            TurnDetail::Grid(grid) => debug!(
                day = report.day,
                bites = grid.bites.len(),
                refused = grid.refused.len(),
                conversions = grid.conversions.len(),
                "Grid turn detail"
            ),
            TurnDetail::StockFlow(flow) => debug!(
                day = report.day,
                bite_rate = flow.bite_rate,
                containment_multiplier = flow.containment_multiplier,
                dropped_bites = flow.dropped_bites,
                "Stock-and-flow turn detail"
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use outbreak_types::{FlowTurn, PopulationCounts, TurnPhase};

    use super::*;

    fn at(day: u64, infected: f64) -> (TurnReport, StatusView) {
        let counts = PopulationCounts {
            susceptible: 10.0,
            incubating: 0.0,
            infected,
        };
        (
            TurnReport {
                day,
                counts,
                outcome: None,
                detail: TurnDetail::StockFlow(FlowTurn::default()),
            },
            StatusView {
                day,
                counts,
                containment_percent: 0.0,
                phase: TurnPhase::AwaitingPlayerAction,
                outcome: None,
            },
        )
    }

    #[test]
    fn tracks_peak_infected() {
        let mut reporter = HudReporter::new();
        for (day, infected) in [(1, 2.0), (2, 7.0), (3, 4.0)] {
            let (report, status) = at(day, infected);
            reporter.on_turn(&report, &status);
        }
        assert_eq!(reporter.peak_infected(), 7.0);
    }
}
