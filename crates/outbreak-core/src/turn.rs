//! Turn engine for the grid variant: discrete agents on a fenced grid.
//!
//! Each call to [`TurnEngine::advance_turn`] runs these phases:
//!
//! 1. **Snapshot** -- advance the clock, then record infected and
//!    susceptible positions with a row-major scan. Agents deciding later in
//!    the turn see this snapshot minus the targets already claimed, never
//!    the bites made earlier in the same turn.
//!
//! 2. **Select** -- Fisher-Yates shuffle the infected agents with the
//!    injected RNG and keep the first `infected_per_turn`.
//!
//! 3. **Hunt** -- each acting agent, in shuffle order, picks the nearest
//!    reachable susceptible agent in the remaining pool by BFS hop count
//!    (ties go to the earlier snapshot entry). It steps one cell along the
//!    shortest path if that cell is empty, then bites the target from range.
//!    A bite moves the target to `Incubating` and enqueues it on the
//!    conveyor. If the conveyor has no room for a whole agent the bite is
//!    refused and the target stays susceptible.
//!
//! 4. **Incubate** -- advance the conveyor. Every released agent is retired
//!    and a new infected agent is spawned on its cell.
//!
//! 5. **Count** -- recompute stocks and verify conservation.
//!
//! 6. **Evaluate** -- apply the [`WinLossEvaluator`] and move to
//!    `Terminal` or back to `AwaitingPlayerAction`.
//!
//! Fences never change the bite rate here; they act only through
//! [`GridTopology::can_move`].

use outbreak_population::{
    ConservationResult, IncubationConveyor, IncubationSettings, verify_conservation,
};
use outbreak_types::{
    AgentId, AgentKind, AgentMove, Bite, Cell, Conversion, EdgeRef, FenceOutcome, GridTurn,
    ModelVariant, Occupant, Placement, PopulationCounts, StatusView, TurnDetail, TurnPhase,
    TurnReport,
};
use outbreak_world::{GridTopology, PathFinder};
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::arena::AgentArena;
use crate::clock::TurnClock;
use crate::config::SimulationConfig;
use crate::model::{self, OutbreakModel, TurnError};
use crate::outcome::{OutcomeInputs, WinLossEvaluator};
use crate::shuffle;

/// Conservation tolerance for whole-agent counts.
const AGENT_TOLERANCE: f64 = 1e-9;

/// Tunables of the grid variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    /// Maximum infected agents that act in one turn.
    pub infected_per_turn: u32,
    /// Conveyor delay and capacity.
    pub incubation: IncubationSettings,
}

impl GridSettings {
    /// Read the grid settings from configuration.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, TurnError> {
        Ok(Self {
            infected_per_turn: config.agents.infected_per_turn,
            incubation: IncubationSettings::new(
                config.incubation.delay_turns,
                config.incubation.capacity,
            )?,
        })
    }
}

/// The grid-variant turn engine.
#[derive(Debug, Clone)]
pub struct TurnEngine<R> {
    grid: GridTopology,
    arena: AgentArena,
    conveyor: IncubationConveyor<AgentId>,
    settings: GridSettings,
    clock: TurnClock,
    phase: TurnPhase,
    rng: R,
}

impl<R: Rng> TurnEngine<R> {
    /// Build an engine over `grid` with agents at `placement`.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::InvalidPlacement`] if a placement cell is
    /// off-grid or used twice.
    pub fn new(
        grid: GridTopology,
        placement: &Placement,
        settings: GridSettings,
        rng: R,
    ) -> Result<Self, TurnError> {
        let mut engine = Self {
            grid,
            arena: AgentArena::new(),
            conveyor: IncubationConveyor::new(),
            settings,
            clock: TurnClock::new(),
            phase: TurnPhase::AwaitingPlayerAction,
            rng,
        };
        for &cell in &placement.susceptible {
            engine.place_agent(AgentKind::Susceptible, cell)?;
        }
        for &cell in &placement.infected {
            engine.place_agent(AgentKind::Infected, cell)?;
        }

        info!(
            width = engine.grid.width(),
            height = engine.grid.height(),
            susceptible = placement.susceptible.len(),
            infected = placement.infected.len(),
            infected_per_turn = settings.infected_per_turn,
            "Grid model ready"
        );
        Ok(engine)
    }

    /// Build an engine from configuration.
    pub fn from_config(
        config: &SimulationConfig,
        placement: &Placement,
        rng: R,
    ) -> Result<Self, TurnError> {
        let grid = GridTopology::new(config.grid.width, config.grid.height)?;
        Self::new(grid, placement, GridSettings::from_config(config)?, rng)
    }

    fn place_agent(&mut self, kind: AgentKind, cell: Cell) -> Result<(), TurnError> {
        if !self.grid.is_empty_cell(cell) {
            return Err(TurnError::InvalidPlacement {
                reason: format!("cell {cell} is off-grid or already occupied"),
            });
        }
        self.arena.spawn(kind, cell)?;
        self.grid.set_occupant(cell, kind.occupant())?;
        Ok(())
    }

    /// The agent arena.
    pub const fn arena(&self) -> &AgentArena {
        &self.arena
    }

    /// The incubation conveyor, tagged by bitten agent.
    pub const fn conveyor(&self) -> &IncubationConveyor<AgentId> {
        &self.conveyor
    }

    /// Turns resolved so far.
    pub const fn day(&self) -> u64 {
        self.clock.day()
    }

    /// Current stocks.
    pub fn counts(&self) -> PopulationCounts {
        PopulationCounts {
            susceptible: model::count_as_stock(self.arena.count(AgentKind::Susceptible)),
            incubating: self.conveyor.current_total(),
            infected: model::count_as_stock(self.arena.count(AgentKind::Infected)),
        }
    }

    /// Whether any infected agent has a fence-free path to any susceptible
    /// agent.
    pub fn infected_can_reach(&self) -> bool {
        let targets = self.grid.cells_with(Occupant::Susceptible);
        if targets.is_empty() {
            return false;
        }
        let finder = PathFinder::new(&self.grid);
        self.grid
            .cells_with(Occupant::Infected)
            .into_iter()
            .any(|from| finder.any_reachable(from, &targets))
    }

    fn resolve_turn(&mut self) -> Result<TurnReport, TurnError> {
        let before = self.counts();
        let day = self.clock.advance()?;

        // 1. Snapshot.
        let infected_cells = self.grid.cells_with(Occupant::Infected);
        let mut pool = self.grid.cells_with(Occupant::Susceptible);
        let infected: Vec<AgentId> = infected_cells
            .iter()
            .filter_map(|&cell| self.arena.agent_at(cell))
            .collect();

        // 2. Select.
        let cap = usize::try_from(self.settings.infected_per_turn).unwrap_or(usize::MAX);
        let acting = shuffle::sample(infected, cap, &mut self.rng);

        let mut detail = GridTurn {
            acting: acting.clone(),
            ..GridTurn::default()
        };

        // 3. Hunt.
        for &agent in &acting {
            self.hunt(agent, &mut pool, &mut detail)?;
        }

        // 4. Incubate.
        let outflow = self.conveyor.advance();
        for batch in outflow.batches {
            let retired = self.arena.retire(batch.cohort)?;
            let spawned = self.arena.spawn(AgentKind::Infected, retired.cell)?;
            self.grid.set_occupant(retired.cell, Occupant::Infected)?;
            debug!(retired = %batch.cohort, spawned = %spawned, cell = %retired.cell, "Agent converted");
            detail.conversions.push(Conversion {
                retired: batch.cohort,
                spawned,
                cell: retired.cell,
            });
        }

        // 5. Count.
        let counts = self.counts();
        if let ConservationResult::Anomaly(anomaly) =
            verify_conservation(day, &before, &counts, AGENT_TOLERANCE)
        {
            error!(day, %anomaly, "Population conservation violated");
        }

        // 6. Evaluate.
        let conveyor_empty = self.conveyor.is_empty();
        let needs_reach_check =
            conveyor_empty && counts.susceptible > 0.0 && counts.infected > 0.0;
        let infected_can_reach = !needs_reach_check || self.infected_can_reach();
        let outcome = WinLossEvaluator::evaluate(&OutcomeInputs {
            day,
            susceptible: counts.susceptible,
            infected: counts.infected,
            conveyor_empty,
            infected_can_reach: Some(infected_can_reach),
        });
        self.phase = model::finish_turn(outcome);

        info!(
            day,
            acting = detail.acting.len(),
            moves = detail.moves.len(),
            bites = detail.bites.len(),
            refused = detail.refused.len(),
            conversions = detail.conversions.len(),
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
            detail: TurnDetail::Grid(detail),
        })
    }

    /// One acting agent: pick a target, step toward it, bite.
    fn hunt(
        &mut self,
        agent: AgentId,
        pool: &mut Vec<Cell>,
        detail: &mut GridTurn,
    ) -> Result<(), TurnError> {
        let Some(from) = self.arena.active(agent).map(|record| record.cell) else {
            return Ok(());
        };

        let (target, path) = {
            let finder = PathFinder::new(&self.grid);
            let Some(field) = finder.distances_from(from) else {
                return Ok(());
            };
            let Some((target, distance)) = field.nearest(pool.iter()) else {
                debug!(%agent, cell = %from, "No reachable target; idle");
                return Ok(());
            };
            let Some(path) = field.path_to(target) else {
                return Ok(());
            };
            debug!(%agent, from = %from, target = %target, distance, "Target selected");
            (target, path)
        };
        pool.retain(|&cell| cell != target);

        // Step one cell along the path if it is free.
        let mut to = from;
        if let Some(&next) = path.get(1) {
            if self.grid.is_empty_cell(next) {
                self.arena.move_to(agent, next)?;
                self.grid.set_occupant(from, Occupant::Empty)?;
                self.grid.set_occupant(next, Occupant::Infected)?;
                to = next;
            }
        }
        detail.moves.push(AgentMove {
            agent,
            from,
            to,
            path,
        });

        let Some(victim) = self.arena.agent_at(target) else {
            return Ok(());
        };
        let bite = Bite {
            attacker: agent,
            victim,
            cell: target,
        };

        let incubation = self.settings.incubation;
        if self.conveyor.free_capacity(incubation.capacity) < 1.0 {
            warn!(%agent, %victim, cell = %target, "Bite refused: incubation capacity full");
            detail.refused.push(bite);
            return Ok(());
        }
        let _accepted = self.conveyor.try_enqueue_cohort(
            1.0,
            incubation.delay_turns,
            incubation.capacity,
            victim,
        );
        self.arena.set_kind(victim, AgentKind::Incubating)?;
        self.grid.set_occupant(target, Occupant::Incubating)?;
        debug!(%agent, %victim, cell = %target, "Bite");
        detail.bites.push(bite);
        Ok(())
    }
}

impl<R: Rng> OutbreakModel for TurnEngine<R> {
    fn variant(&self) -> ModelVariant {
        ModelVariant::Grid
    }

    fn place_fence(&mut self, edge: EdgeRef) -> FenceOutcome {
        self.grid.place_fence(edge)
    }

    fn place_fence_by_id(&mut self, id: u32) -> FenceOutcome {
        self.grid.place_fence_by_id(id)
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
    clippy::indexing_slicing
)]
mod tests {
    use outbreak_types::{Direction, Outcome};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn settings(per_turn: u32, delay: f64, capacity: f64) -> GridSettings {
        GridSettings {
            infected_per_turn: per_turn,
            incubation: IncubationSettings::new(delay, capacity).unwrap(),
        }
    }

    fn engine(
        width: u32,
        height: u32,
        susceptible: &[(i32, i32)],
        infected: &[(i32, i32)],
        settings: GridSettings,
    ) -> TurnEngine<StdRng> {
        let placement = Placement {
            susceptible: susceptible.iter().map(|&(x, y)| Cell::new(x, y)).collect(),
            infected: infected.iter().map(|&(x, y)| Cell::new(x, y)).collect(),
        };
        TurnEngine::new(
            GridTopology::new(width, height).unwrap(),
            &placement,
            settings,
            StdRng::seed_from_u64(7),
        )
        .unwrap()
    }

    fn grid_detail(report: &TurnReport) -> &GridTurn {
        match &report.detail {
            TurnDetail::Grid(detail) => detail,
            TurnDetail::StockFlow(_) => unreachable!("grid engine produced a flow report"),
        }
    }

    #[test]
    fn overlapping_placement_rejected() {
        let placement = Placement {
            susceptible: vec![Cell::new(0, 0)],
            infected: vec![Cell::new(0, 0)],
        };
        let result = TurnEngine::new(
            GridTopology::new(2, 2).unwrap(),
            &placement,
            settings(1, 2.0, 10.0),
            StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(TurnError::InvalidPlacement { .. })));
    }

    #[test]
    fn agent_steps_toward_and_bites_distant_target() {
        let mut e = engine(5, 5, &[(4, 4)], &[(0, 0)], settings(1, 3.0, 10.0));
        let report = e.advance_turn().unwrap();
        let detail = grid_detail(&report);

        assert_eq!(detail.moves.len(), 1);
        let step = &detail.moves[0];
        assert_eq!(step.path.len(), 9);
        assert_eq!(step.to, Cell::new(1, 0));
        assert_eq!(detail.bites.len(), 1);
        assert_eq!(e.grid().occupant(Cell::new(4, 4)), Some(Occupant::Incubating));
        assert_eq!(e.grid().occupant(Cell::new(1, 0)), Some(Occupant::Infected));
        assert_eq!(report.counts.susceptible, 0.0);
        assert_eq!(report.counts.incubating, 1.0);
        assert_eq!(report.outcome, Some(Outcome::Lost));
        assert_eq!(e.phase(), TurnPhase::Terminal(Outcome::Lost));
    }

    #[test]
    fn fenced_corner_is_contained() {
        let mut e = engine(5, 5, &[(4, 4)], &[(0, 0)], settings(1, 3.0, 10.0));
        assert_eq!(e.grid.place_fence_at(Cell::new(0, 0), Direction::East), FenceOutcome::Placed);
        assert_eq!(e.grid.place_fence_at(Cell::new(0, 0), Direction::South), FenceOutcome::Placed);
        let report = e.advance_turn().unwrap();
        assert!(grid_detail(&report).moves.is_empty());
        assert_eq!(report.outcome, Some(Outcome::Contained));
    }

    #[test]
    fn pending_incubation_blocks_containment() {
        // Two humans; one is bitten, then the infected agent is walled in
        // with the other human out of reach. While the bitten one incubates
        // the outbreak is not contained.
        let mut e = engine(3, 1, &[(1, 0), (2, 0)], &[(0, 0)], settings(1, 2.0, 10.0));
        let first = e.advance_turn().unwrap();
        assert_eq!(grid_detail(&first).bites[0].cell, Cell::new(1, 0));
        let right = e.grid().edge_between(Cell::new(1, 0), Cell::new(2, 0)).unwrap();
        let left = e.grid().edge_between(Cell::new(0, 0), Cell::new(1, 0)).unwrap();
        assert_eq!(e.place_fence(right), FenceOutcome::Placed);
        assert_eq!(e.place_fence(left), FenceOutcome::Placed);
        assert_eq!(first.outcome, None);
        assert_eq!(e.phase(), TurnPhase::AwaitingPlayerAction);

        // Day 2: the incubating agent converts; the new infected is walled
        // off from the last human too, and the conveyor is empty again.
        let second = e.advance_turn().unwrap();
        assert_eq!(grid_detail(&second).conversions.len(), 1);
        assert_eq!(second.outcome, Some(Outcome::Contained));
    }

    #[test]
    fn no_two_agents_bite_the_same_target() {
        let mut e = engine(5, 1, &[(2, 0)], &[(0, 0), (4, 0)], settings(2, 3.0, 10.0));
        let report = e.advance_turn().unwrap();
        let detail = grid_detail(&report);
        assert_eq!(detail.acting.len(), 2);
        assert_eq!(detail.bites.len(), 1);
        assert_eq!(detail.moves.len(), 1);
    }

    #[test]
    fn full_conveyor_refuses_bites() {
        let mut e = engine(3, 1, &[(1, 0)], &[(0, 0)], settings(1, 3.0, 0.5));
        let report = e.advance_turn().unwrap();
        let detail = grid_detail(&report);
        assert!(detail.bites.is_empty());
        assert_eq!(detail.refused.len(), 1);
        assert_eq!(e.grid().occupant(Cell::new(1, 0)), Some(Occupant::Susceptible));
        assert_eq!(report.outcome, None);
    }

    #[test]
    fn conversion_spawns_new_infected_on_the_cell() {
        let mut e = engine(4, 1, &[(1, 0), (3, 0)], &[(0, 0)], settings(1, 1.0, 10.0));
        let report = e.advance_turn().unwrap();
        let detail = grid_detail(&report);
        assert_eq!(detail.conversions.len(), 1);
        let conversion = detail.conversions[0];
        assert_eq!(conversion.cell, Cell::new(1, 0));
        assert_ne!(conversion.spawned, conversion.retired);
        assert!(e.arena().active(conversion.retired).is_none());
        assert_eq!(e.grid().occupant(Cell::new(1, 0)), Some(Occupant::Infected));
        assert_eq!(report.counts.infected, 2.0);
        assert_eq!(report.counts.total(), 3.0);
    }

    #[test]
    fn acting_cap_limits_bites() {
        let mut e = engine(
            6,
            2,
            &[(0, 1), (2, 1), (4, 1)],
            &[(0, 0), (2, 0), (4, 0)],
            settings(2, 5.0, 10.0),
        );
        let report = e.advance_turn().unwrap();
        assert_eq!(grid_detail(&report).acting.len(), 2);
        assert_eq!(grid_detail(&report).bites.len(), 2);
    }

    #[test]
    fn terminal_engine_rejects_turns() {
        let mut e = engine(2, 1, &[], &[(0, 0)], settings(1, 2.0, 10.0));
        let report = e.advance_turn().unwrap();
        assert_eq!(report.outcome, Some(Outcome::Lost));
        assert!(matches!(
            e.advance_turn(),
            Err(TurnError::AlreadyTerminal {
                outcome: Outcome::Lost
            })
        ));
        assert_eq!(e.day(), 1);
    }

    #[test]
    fn status_reports_containment_percent() {
        let mut e = engine(1, 1, &[(0, 0)], &[], settings(1, 2.0, 10.0));
        let _ = e.place_fence(EdgeRef::horizontal(0));
        let status = e.status();
        assert_eq!(status.containment_percent, 25.0);
        assert_eq!(status.day, 0);
        assert_eq!(status.outcome, None);
    }
}
