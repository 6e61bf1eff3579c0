//! End-to-end scenarios for both model variants.
//!
//! Each test builds a model from YAML configuration the way the engine
//! binary does, then drives it through [`run_simulation`] or turn by turn.

// Integration tests use unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::missing_panics_doc
)]

use outbreak_core::command::{IdleCommands, ScriptedCommands};
use outbreak_core::config::SimulationConfig;
use outbreak_core::model::{OutbreakModel, TurnError};
use outbreak_core::runner::{
    NoOpCallback, RunSettings, SimulationEndReason, TurnCallback, run_simulation,
};
use outbreak_core::stock_flow::StockFlowEngine;
use outbreak_core::turn::TurnEngine;
use outbreak_types::{Cell, Outcome, Placement, StatusView, TurnDetail, TurnPhase, TurnReport};
use rand::SeedableRng;
use rand::rngs::StdRng;

const FLOW_YAML: &str = r"
model:
  variant: stock_flow
population:
  initial_susceptible: 100
  initial_infected: 1
  normal_bite_rate: 1.0
  land_area: 100
  normal_density: 1.0
incubation:
  delay_turns: 3
  capacity: 100
density_curve:
  points:
    - [2.0, 1.5]
    - [0.0, 0.5]
    - [1.0, 1.0]
";

/// Asserts the population total never changes.
struct ConservationWatch {
    total: f64,
    turns: u64,
}

impl TurnCallback for ConservationWatch {
    fn on_turn(&mut self, report: &TurnReport, status: &StatusView) {
        assert!(
            (report.counts.total() - self.total).abs() < 1e-6,
            "day {}: total {} != {}",
            report.day,
            report.counts.total(),
            self.total
        );
        assert_eq!(status.counts, report.counts);
        self.turns += 1;
    }
}

fn scattered_placement() -> Placement {
    Placement {
        susceptible: vec![
            Cell::new(5, 0),
            Cell::new(2, 3),
            Cell::new(4, 4),
            Cell::new(0, 5),
            Cell::new(5, 5),
        ],
        infected: vec![Cell::new(0, 0), Cell::new(3, 1)],
    }
}

fn grid_config(extra: &str) -> SimulationConfig {
    let yaml = format!(
        "grid: {{ width: 6, height: 6 }}\nagents: {{ infected_per_turn: 3 }}\nincubation: {{ delay_turns: 1, capacity: 10 }}\n{extra}"
    );
    SimulationConfig::parse(&yaml).unwrap()
}

#[test]
fn aggregate_first_turn_from_config() {
    let config = SimulationConfig::parse(FLOW_YAML).unwrap();
    config.validate().unwrap();
    let mut model = StockFlowEngine::from_config(&config).unwrap();

    let report = model.advance_turn().unwrap();
    let TurnDetail::StockFlow(flow) = report.detail else {
        panic!("expected a stock-and-flow report");
    };
    assert_eq!(flow.density_ratio, 1.0);
    assert_eq!(flow.effect, 1.0);
    assert_eq!(flow.newly_bitten, 1.0);
    assert_eq!(report.counts.susceptible, 99.0);
    assert_eq!(report.counts.incubating, 1.0);
    assert_eq!(model.status().day, 1);
    assert_eq!(model.phase(), TurnPhase::AwaitingPlayerAction);
}

#[test]
fn aggregate_run_conserves_population() {
    let config = SimulationConfig::parse(FLOW_YAML).unwrap();
    let mut model = StockFlowEngine::from_config(&config).unwrap();
    let mut watch = ConservationWatch {
        total: 101.0,
        turns: 0,
    };
    let result = run_simulation(
        &mut model,
        RunSettings {
            max_turns: 200,
            score_multiplier: 100,
        },
        &mut IdleCommands,
        &mut watch,
    )
    .unwrap();
    assert_eq!(watch.turns, result.total_turns);
    assert_eq!(result.end_reason, SimulationEndReason::Lost);
    assert_eq!(result.final_report.counts.susceptible, 0.0);
}

#[test]
fn grid_runs_are_reproducible_for_a_seed() {
    let config = grid_config("");
    let run = |seed: u64| {
        let mut model = TurnEngine::from_config(
            &config,
            &scattered_placement(),
            StdRng::seed_from_u64(seed),
        )
        .unwrap();
        run_simulation(
            &mut model,
            RunSettings::from_config(&config),
            &mut IdleCommands,
            &mut NoOpCallback,
        )
        .unwrap()
    };
    assert_eq!(run(7), run(7));
}

#[test]
fn unfenced_grid_is_lost_and_conserves_agents() {
    let config = grid_config("");
    let mut model =
        TurnEngine::from_config(&config, &scattered_placement(), StdRng::seed_from_u64(3))
            .unwrap();
    let mut watch = ConservationWatch {
        total: 7.0,
        turns: 0,
    };
    let result = run_simulation(
        &mut model,
        RunSettings::from_config(&config),
        &mut IdleCommands,
        &mut watch,
    )
    .unwrap();

    assert_eq!(result.end_reason, SimulationEndReason::Lost);
    assert!(result.total_turns <= 5, "took {} turns", result.total_turns);
    assert_eq!(result.saved, None);
    assert_eq!(result.score, None);
    assert_eq!(result.final_report.counts.infected, 7.0);
}

#[test]
fn scripted_enclosure_contains_the_outbreak() {
    // Box in the infected at (1, 1) of a 3x3 grid before the first turn.
    let config = SimulationConfig::parse(
        r"
grid: { width: 3, height: 3 }
agents: { initial_susceptible: 2, initial_infected: 1, infected_per_turn: 1 }
scenario:
  fences:
    - { day: 1, axis: horizontal, index: 4 }
    - { day: 1, axis: horizontal, index: 7 }
    - { day: 1, axis: vertical, index: 5 }
    - { day: 1, axis: vertical, index: 6 }
",
    )
    .unwrap();
    config.validate().unwrap();
    let placement = Placement {
        susceptible: vec![Cell::new(0, 0), Cell::new(2, 2)],
        infected: vec![Cell::new(1, 1)],
    };
    let mut model =
        TurnEngine::from_config(&config, &placement, StdRng::seed_from_u64(1)).unwrap();
    let mut script = ScriptedCommands::from_config(&config.scenario);

    let result = run_simulation(
        &mut model,
        RunSettings::from_config(&config),
        &mut script,
        &mut NoOpCallback,
    )
    .unwrap();

    assert_eq!(result.end_reason, SimulationEndReason::Contained);
    assert_eq!(result.total_turns, 1);
    assert_eq!(result.saved, Some(2));
    assert_eq!(result.score, Some(200));
    assert_eq!(model.status().containment_percent, 4.0 / 24.0 * 100.0);
    assert_eq!(model.phase(), TurnPhase::Terminal(Outcome::Contained));

    assert!(matches!(
        model.advance_turn(),
        Err(TurnError::AlreadyTerminal {
            outcome: Outcome::Contained
        })
    ));
}

#[test]
fn result_serializes_for_the_report() {
    let config = SimulationConfig::parse(FLOW_YAML).unwrap();
    let mut model = StockFlowEngine::from_config(&config).unwrap();
    let result = run_simulation(
        &mut model,
        RunSettings {
            max_turns: 2,
            score_multiplier: 100,
        },
        &mut IdleCommands,
        &mut NoOpCallback,
    )
    .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["end_reason"], "max_turns_reached");
    assert_eq!(json["total_turns"], 2);
    assert_eq!(json["final_report"]["detail"]["variant"], "stock_flow");
    assert!(json["score"].is_null());
}
