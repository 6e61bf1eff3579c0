//! Stock-and-flow engine: the aggregate variant.
//!
//! No individual agents are tracked. Each turn computes a bite rate from
//! population density and fencing, moves bitten population onto the
//! incubation conveyor, and moves conveyor outflow into the infected stock:
//!
//! ```text
//! density        = (susceptible + bitten) / land_area
//! effect         = curve.lookup(density / normal_density)
//! bite_rate      = normal_bite_rate * effect * containment_multiplier
//! total_bites    = round(infected * bite_rate)
//! share          = round(total_bites * susceptible / max(susceptible + bitten, 1))
//! newly_bitten   = min(share, susceptible)
//! outflow        = conveyor.advance()
//! enqueued       = conveyor.try_enqueue(newly_bitten, delay, capacity)
//! susceptible   -= enqueued
//! infected      += outflow
//! ```
//!
//! `bitten` is always `conveyor.current_total()`. Bites the conveyor has no
//! room for are reported as dropped and stay in the susceptible stock.
//! Rounding is `f64::round`, half away from zero.

use outbreak_population::{
    ConservationResult, DensityResponseCurve, IncubationConveyor, IncubationSettings,
    verify_conservation,
};
use outbreak_types::{
    EdgeRef, FenceOutcome, FlowTurn, ModelVariant, PopulationCounts, StatusView, TurnDetail,
    TurnPhase, TurnReport,
};
use outbreak_world::GridTopology;
use tracing::{debug, error, info};

use crate::clock::TurnClock;
use crate::config::SimulationConfig;
use crate::model::{self, OutbreakModel, TurnError};
use crate::outcome::{OutcomeInputs, WinLossEvaluator};

/// Conservation tolerance for continuous stocks.
const STOCK_TOLERANCE: f64 = 1e-6;

/// `clamp(1 - fenced_fraction, floor, 1)`.
///
/// Never panics: a floor outside `[0, 1]` or a NaN input degrades to the
/// nearest bound.
pub const fn containment_multiplier(fenced_fraction: f64, floor: f64) -> f64 {
    (1.0 - fenced_fraction).max(floor).min(1.0)
}

/// Rates and constants of the aggregate variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowParams {
    /// Bites per infected per turn at normal density with no fences.
    pub normal_bite_rate: f64,
    /// Area the population is spread over.
    pub land_area: f64,
    /// Density at ratio 1.
    pub normal_density: f64,
    /// Floor of the containment multiplier.
    pub min_multiplier: f64,
    /// Conveyor delay and capacity.
    pub incubation: IncubationSettings,
}

impl FlowParams {
    /// Read the aggregate parameters from configuration.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, TurnError> {
        Ok(Self {
            normal_bite_rate: config.population.normal_bite_rate,
            land_area: config.population.land_area,
            normal_density: config.population.normal_density,
            min_multiplier: config.containment.min_multiplier,
            incubation: IncubationSettings::new(
                config.incubation.delay_turns,
                config.incubation.capacity,
            )?,
        })
    }
}

/// The aggregate-variant engine.
#[derive(Debug, Clone)]
pub struct StockFlowEngine {
    grid: GridTopology,
    curve: DensityResponseCurve,
    conveyor: IncubationConveyor,
    params: FlowParams,
    susceptible: f64,
    infected: f64,
    multiplier: f64,
    clock: TurnClock,
    phase: TurnPhase,
}

impl StockFlowEngine {
    /// Build an engine with the given starting stocks.
    ///
    /// `grid` only carries the fence layer; its occupancy stays empty.
    pub fn new(
        grid: GridTopology,
        curve: DensityResponseCurve,
        params: FlowParams,
        susceptible: f64,
        infected: f64,
    ) -> Self {
        let multiplier = containment_multiplier(grid.fenced_fraction(), params.min_multiplier);
        info!(
            susceptible,
            infected,
            curve_points = curve.points().len(),
            multiplier,
            "Stock-and-flow model ready"
        );
        Self {
            grid,
            curve,
            conveyor: IncubationConveyor::new(),
            params,
            susceptible: susceptible.max(0.0),
            infected: infected.max(0.0),
            multiplier,
            clock: TurnClock::new(),
            phase: TurnPhase::AwaitingPlayerAction,
        }
    }

    /// Build an engine from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::Curve`] if `density_curve` is absent; the
    /// aggregate variant cannot run without it.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, TurnError> {
        let curve = DensityResponseCurve::require(
            config
                .density_curve
                .as_ref()
                .map(|table| table.points.as_slice()),
        )?;
        let grid = GridTopology::new(config.grid.width, config.grid.height)?;
        Ok(Self::new(
            grid,
            curve,
            FlowParams::from_config(config)?,
            config.population.initial_susceptible,
            config.population.initial_infected,
        ))
    }

    /// Current containment multiplier.
    pub const fn containment_multiplier(&self) -> f64 {
        self.multiplier
    }

    /// The incubation conveyor.
    pub const fn conveyor(&self) -> &IncubationConveyor {
        &self.conveyor
    }

    /// Current stocks.
    pub fn counts(&self) -> PopulationCounts {
        PopulationCounts {
            susceptible: self.susceptible,
            incubating: self.conveyor.current_total(),
            infected: self.infected,
        }
    }

    fn refresh_multiplier(&mut self) {
        self.multiplier =
            containment_multiplier(self.grid.fenced_fraction(), self.params.min_multiplier);
        debug!(
            fenced_fraction = self.grid.fenced_fraction(),
            multiplier = self.multiplier,
            "Containment multiplier updated"
        );
    }

    fn resolve_turn(&mut self) -> Result<TurnReport, TurnError> {
        let before = self.counts();
        let day = self.clock.advance()?;
        let params = self.params;

        let bitten = self.conveyor.current_total();
        let density = (self.susceptible + bitten) / params.land_area;
        let density_ratio = density / params.normal_density;
        let effect = self.curve.lookup(density_ratio);
        let bite_rate = params.normal_bite_rate * effect * self.multiplier;
        let total_bites = (self.infected * bite_rate).round().max(0.0);
        let share = (total_bites * self.susceptible / (self.susceptible + bitten).max(1.0)).round();
        let newly_bitten = share.min(self.susceptible).max(0.0);

        let outflow = self.conveyor.advance();
        let enqueued = self.conveyor.try_enqueue(
            newly_bitten,
            params.incubation.delay_turns,
            params.incubation.capacity,
        );
        let dropped_bites = (newly_bitten - enqueued).max(0.0);

        self.susceptible = (self.susceptible - enqueued).max(0.0);
        self.infected += outflow.amount;

        let flow = FlowTurn {
            density,
            density_ratio,
            effect,
            containment_multiplier: self.multiplier,
            bite_rate,
            total_bites,
            newly_bitten,
            enqueued,
            dropped_bites,
            outflow: outflow.amount,
        };

        let counts = self.counts();
        if let ConservationResult::Anomaly(anomaly) =
            verify_conservation(day, &before, &counts, STOCK_TOLERANCE)
        {
            error!(day, %anomaly, "Population conservation violated");
        }

        let outcome = WinLossEvaluator::evaluate(&OutcomeInputs {
            day,
            susceptible: counts.susceptible,
            infected: counts.infected,
            conveyor_empty: self.conveyor.is_empty(),
            infected_can_reach: None,
        });
        self.phase = model::finish_turn(outcome);

        info!(
            day,
            bite_rate,
            newly_bitten,
            enqueued,
            dropped_bites,
            outflow = flow.outflow,
            susceptible = counts.susceptible,
            incubating = counts.incubating,
            infected = counts.infected,
            outcome = ?outcome,
            "Turn resolved"
        );

        Ok(TurnReport {
            day,
            counts,
            outcome,
            detail: TurnDetail::StockFlow(flow),
        })
    }
}

impl OutbreakModel for StockFlowEngine {
    fn variant(&self) -> ModelVariant {
        ModelVariant::StockFlow
    }

    fn place_fence(&mut self, edge: EdgeRef) -> FenceOutcome {
        let outcome = self.grid.place_fence(edge);
        if outcome.changed() {
            self.refresh_multiplier();
        }
        outcome
    }

    fn place_fence_by_id(&mut self, id: u32) -> FenceOutcome {
        let outcome = self.grid.place_fence_by_id(id);
        if outcome.changed() {
            self.refresh_multiplier();
        }
        outcome
    }

    fn advance_turn(&mut self) -> Result<TurnReport, TurnError> {
        model::begin_turn(&mut self.phase)?;
        self.resolve_turn()
    }

    fn phase(&self) -> TurnPhase {
        self.phase
    }

    fn status(&self) -> StatusView {
        StatusView {
            day: self.clock.day(),
            counts: self.counts(),
            containment_percent: self.grid.fenced_fraction() * 100.0,
            phase: self.phase,
            outcome: self.phase.outcome(),
        }
    }

    fn grid(&self) -> &GridTopology {
        &self.grid
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::unreachable,
    clippy::arithmetic_side_effects
)]
mod tests {
    use outbreak_types::Outcome;

    use super::*;

    fn params(capacity: f64, delay: f64) -> FlowParams {
        FlowParams {
            normal_bite_rate: 1.0,
            land_area: 100.0,
            normal_density: 1.0,
            min_multiplier: 0.5,
            incubation: IncubationSettings::new(delay, capacity).unwrap(),
        }
    }

    fn flat_curve() -> DensityResponseCurve {
        DensityResponseCurve::from_pairs(&[[0.0, 1.0], [10.0, 1.0]]).unwrap()
    }

    fn engine(susceptible: f64, infected: f64, capacity: f64, delay: f64) -> StockFlowEngine {
        StockFlowEngine::new(
            GridTopology::new(10, 10).unwrap(),
            flat_curve(),
            params(capacity, delay),
            susceptible,
            infected,
        )
    }

    fn flow(report: &TurnReport) -> FlowTurn {
        match report.detail {
            TurnDetail::StockFlow(flow) => flow,
            TurnDetail::Grid(_) => unreachable!("flow engine produced a grid report"),
        }
    }

    #[test]
    fn first_turn_bites_one() {
        let mut e = engine(100.0, 1.0, 100.0, 3.0);
        let report = e.advance_turn().unwrap();
        let f = flow(&report);
        assert_eq!(f.total_bites, 1.0);
        assert_eq!(f.newly_bitten, 1.0);
        assert_eq!(f.enqueued, 1.0);
        assert_eq!(e.conveyor().current_total(), 1.0);
        assert_eq!(report.counts.susceptible, 99.0);
        assert_eq!(report.counts.infected, 1.0);
        assert_eq!(report.outcome, None);
    }

    #[test]
    fn conveyor_outflow_becomes_infected_after_delay() {
        let mut e = engine(100.0, 1.0, 100.0, 2.0);
        let _ = e.advance_turn().unwrap();
        let second = e.advance_turn().unwrap();
        assert_eq!(flow(&second).outflow, 0.0);
        let third = e.advance_turn().unwrap();
        assert_eq!(flow(&third).outflow, 1.0);
        assert_eq!(third.counts.total(), 101.0);
    }

    #[test]
    fn capacity_drops_excess_bites_without_losing_population() {
        let mut e = engine(100.0, 10.0, 4.0, 5.0);
        let report = e.advance_turn().unwrap();
        let f = flow(&report);
        assert_eq!(f.newly_bitten, 10.0);
        assert_eq!(f.enqueued, 4.0);
        assert_eq!(f.dropped_bites, 6.0);
        assert_eq!(report.counts.susceptible, 96.0);
        assert_eq!(report.counts.total(), 110.0);
    }

    #[test]
    fn fences_damp_the_bite_rate_down_to_the_floor() {
        let mut e = engine(100.0, 10.0, 100.0, 3.0);
        assert_eq!(e.containment_multiplier(), 1.0);
        let edges = e.grid().edge_count();
        for id in 0..edges / 4 {
            let _ = e.place_fence_by_id(id);
        }
        assert!((e.containment_multiplier() - 0.75).abs() < 1e-12);
        for id in 0..edges {
            let _ = e.place_fence_by_id(id);
        }
        assert_eq!(e.containment_multiplier(), 0.5);
        let report = e.advance_turn().unwrap();
        assert_eq!(flow(&report).total_bites, 5.0);
    }

    #[test]
    fn cannot_bite_more_than_exist() {
        let mut e = engine(3.0, 50.0, 100.0, 3.0);
        let report = e.advance_turn().unwrap();
        assert_eq!(flow(&report).newly_bitten, 3.0);
        assert_eq!(report.counts.susceptible, 0.0);
        assert_eq!(report.outcome, Some(Outcome::Lost));
    }

    #[test]
    fn no_infected_and_empty_conveyor_is_contained() {
        let mut e = engine(50.0, 0.0, 100.0, 3.0);
        let report = e.advance_turn().unwrap();
        assert_eq!(report.outcome, Some(Outcome::Contained));
        assert!(matches!(e.advance_turn(), Err(TurnError::AlreadyTerminal { .. })));
    }

    #[test]
    fn multiplier_clamps_without_panicking() {
        assert_eq!(containment_multiplier(0.0, 0.5), 1.0);
        assert_eq!(containment_multiplier(0.9, 0.5), 0.5);
        assert_eq!(containment_multiplier(0.2, 0.5), 0.8);
        assert_eq!(containment_multiplier(f64::NAN, 0.5), 0.5);
    }

    #[test]
    fn missing_curve_is_fatal() {
        let config = SimulationConfig::parse("model: { variant: stock_flow }").unwrap();
        assert!(matches!(
            StockFlowEngine::from_config(&config),
            Err(TurnError::Curve { .. })
        ));
    }
}
