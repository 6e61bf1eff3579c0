//! Headless run loop.
//!
//! [`run_simulation`] drives any [`OutbreakModel`] turn by turn:
//!
//! - **Player action**: before each turn, apply the commands the
//!   [`CommandSource`] has for that day.
//! - **Resolve**: call `advance_turn` and hand the report to the
//!   [`TurnCallback`].
//! - **Stop**: on a terminal outcome, or once `max_turns` turns have run.
//!
//! A contained outbreak is scored: every susceptible survivor is worth
//! `score_multiplier` points.

use outbreak_types::{Outcome, StatusView, TurnReport};
use serde::Serialize;
use tracing::{debug, info};

use crate::command::CommandSource;
use crate::config::SimulationConfig;
use crate::model::{OutbreakModel, TurnError};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A turn failed to resolve.
    #[error("turn error: {source}")]
    Turn {
        /// The underlying turn error.
        #[from]
        source: TurnError,
    },
}

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationEndReason {
    /// The outbreak can no longer spread.
    Contained,
    /// No susceptible population remains.
    Lost,
    /// Reached the configured `max_turns` limit without a verdict.
    MaxTurnsReached,
}

impl From<Outcome> for SimulationEndReason {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Contained => Self::Contained,
            Outcome::Lost => Self::Lost,
        }
    }
}

/// Limits and scoring for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Stop after this many turns. 0 means unlimited.
    pub max_turns: u64,
    /// Points per susceptible survivor of a contained outbreak.
    pub score_multiplier: u64,
}

impl RunSettings {
    /// Read the run settings from configuration.
    pub const fn from_config(config: &SimulationConfig) -> Self {
        Self {
            max_turns: config.simulation.max_turns,
            score_multiplier: config.scoring.multiplier,
        }
    }

    const fn turn_limit_reached(&self, total_turns: u64) -> bool {
        self.max_turns > 0 && total_turns >= self.max_turns
    }
}

/// Result of the simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The report of the last turn executed.
    pub final_report: TurnReport,
    /// Total number of turns executed.
    pub total_turns: u64,
    /// Susceptible survivors, when the outbreak was contained.
    pub saved: Option<u64>,
    /// `saved * score_multiplier`, when the outbreak was contained.
    pub score: Option<u64>,
}

/// Callback invoked after each turn resolves.
pub trait TurnCallback {
    /// Called after a turn resolves successfully.
    fn on_turn(&mut self, report: &TurnReport, status: &StatusView);
}

/// A no-op turn callback for testing.
pub struct NoOpCallback;

impl TurnCallback for NoOpCallback {
    fn on_turn(&mut self, _report: &TurnReport, _status: &StatusView) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a turn fails to resolve, including when
/// `model` has already reached a terminal state.
pub fn run_simulation(
    model: &mut dyn OutbreakModel,
    settings: RunSettings,
    commands: &mut dyn CommandSource,
    callback: &mut dyn TurnCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut total_turns: u64 = 0;

    info!(
        variant = ?model.variant(),
        max_turns = settings.max_turns,
        "Simulation starting"
    );

    loop {
        // --- Player action ---
        let day = model.status().day.saturating_add(1);
        for command in commands.commands_for(day) {
            let outcome = command.apply(model);
            debug!(day, ?command, ?outcome, "Player command applied");
        }

        // --- Resolve turn ---
        let report = model.advance_turn()?;
        total_turns = total_turns.saturating_add(1);
        callback.on_turn(&report, &model.status());

        // --- Check verdict ---
        if let Some(outcome) = report.outcome {
            info!(day = report.day, %outcome, "Terminal outcome reached");
            return Ok(finish(outcome.into(), report, total_turns, settings));
        }

        // --- Check turn limit ---
        if settings.turn_limit_reached(total_turns) {
            info!(
                day = report.day,
                max_turns = settings.max_turns,
                "Turn limit reached"
            );
            return Ok(finish(
                SimulationEndReason::MaxTurnsReached,
                report,
                total_turns,
                settings,
            ));
        }
    }
}

fn finish(
    end_reason: SimulationEndReason,
    report: TurnReport,
    total_turns: u64,
    settings: RunSettings,
) -> SimulationResult {
    let saved = (end_reason == SimulationEndReason::Contained)
        .then(|| whole_survivors(report.counts.susceptible));
    let score = saved.map(|saved| saved.saturating_mul(settings.score_multiplier));
    SimulationResult {
        end_reason,
        final_report: report,
        total_turns,
        saved,
        score,
    }
}

/// Round a susceptible stock to whole survivors, clamped at zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_survivors(susceptible: f64) -> u64 {
    susceptible.round().max(0.0) as u64
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_turns = result.total_turns,
        final_day = result.final_report.day,
        saved = result.saved,
        score = result.score,
        "Simulation ended"
    );

    let counts = &result.final_report.counts;
    info!(
        susceptible = counts.susceptible,
        incubating = counts.incubating,
        infected = counts.infected,
        "Final turn summary"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use outbreak_population::{DensityResponseCurve, IncubationSettings};
    use outbreak_types::{Cell, Placement};
    use outbreak_world::GridTopology;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::command::{IdleCommands, PlayerCommand, ScriptedCommands};
    use crate::stock_flow::{FlowParams, StockFlowEngine};
    use crate::turn::{GridSettings, TurnEngine};

    struct Recorder(Vec<u64>);

    impl TurnCallback for Recorder {
        fn on_turn(&mut self, report: &TurnReport, status: &StatusView) {
            assert_eq!(report.day, status.day);
            self.0.push(report.day);
        }
    }

    fn settings(max_turns: u64) -> RunSettings {
        RunSettings {
            max_turns,
            score_multiplier: 100,
        }
    }

    fn slow_flow() -> StockFlowEngine {
        StockFlowEngine::new(
            GridTopology::new(4, 4).unwrap(),
            DensityResponseCurve::from_pairs(&[[0.0, 0.01], [10.0, 0.01]]).unwrap(),
            FlowParams {
                normal_bite_rate: 1.0,
                land_area: 100.0,
                normal_density: 1.0,
                min_multiplier: 0.5,
                incubation: IncubationSettings::new(3.0, 100.0).unwrap(),
            },
            100.0,
            1.0,
        )
    }

    #[test]
    fn stops_at_turn_limit() {
        let mut model = slow_flow();
        let mut recorder = Recorder(Vec::new());
        let result =
            run_simulation(&mut model, settings(4), &mut IdleCommands, &mut recorder).unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxTurnsReached);
        assert_eq!(result.total_turns, 4);
        assert_eq!(recorder.0, vec![1, 2, 3, 4]);
        assert_eq!(result.score, None);
    }

    #[test]
    fn isolated_grid_is_contained_and_scored() {
        // Infected walled into the top-left cell on day 1.
        let placement = Placement {
            susceptible: vec![Cell::new(2, 2), Cell::new(3, 3)],
            infected: vec![Cell::new(0, 0)],
        };
        let mut model = TurnEngine::new(
            GridTopology::new(4, 4).unwrap(),
            &placement,
            GridSettings {
                infected_per_turn: 1,
                incubation: IncubationSettings::new(2.0, 10.0).unwrap(),
            },
            StdRng::seed_from_u64(1),
        )
        .unwrap();
        let east = model
            .grid()
            .edge_between(Cell::new(0, 0), Cell::new(1, 0))
            .unwrap();
        let south = model
            .grid()
            .edge_between(Cell::new(0, 0), Cell::new(0, 1))
            .unwrap();
        let mut script = ScriptedCommands::new();
        script.push(1, PlayerCommand::PlaceFence(east));
        script.push(1, PlayerCommand::PlaceFence(south));

        let result =
            run_simulation(&mut model, settings(50), &mut script, &mut NoOpCallback).unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::Contained);
        assert_eq!(result.total_turns, 1);
        assert_eq!(result.saved, Some(2));
        assert_eq!(result.score, Some(200));
    }

    #[test]
    fn terminal_model_is_an_error() {
        let mut model = StockFlowEngine::new(
            GridTopology::new(2, 2).unwrap(),
            DensityResponseCurve::from_pairs(&[[0.0, 1.0]]).unwrap(),
            FlowParams {
                normal_bite_rate: 1.0,
                land_area: 1.0,
                normal_density: 1.0,
                min_multiplier: 0.0,
                incubation: IncubationSettings::new(1.0, 10.0).unwrap(),
            },
            5.0,
            0.0,
        );
        let first =
            run_simulation(&mut model, settings(0), &mut IdleCommands, &mut NoOpCallback).unwrap();
        assert_eq!(first.end_reason, SimulationEndReason::Contained);
        assert_eq!(first.score, Some(500));

        let again = run_simulation(&mut model, settings(0), &mut IdleCommands, &mut NoOpCallback);
        assert!(matches!(
            again,
            Err(RunnerError::Turn {
                source: TurnError::AlreadyTerminal { .. }
            })
        ));
    }

    #[test]
    fn survivors_round_and_clamp() {
        assert_eq!(whole_survivors(2.4), 2);
        assert_eq!(whole_survivors(2.5), 3);
        assert_eq!(whole_survivors(-1.0), 0);
    }
}
