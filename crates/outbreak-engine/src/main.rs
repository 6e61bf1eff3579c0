//! Headless engine binary for the Outbreak simulation.
//!
//! Loads configuration, places the starting population, builds the
//! configured model variant, replays the scripted fence placements, and
//! runs turns until the outbreak is contained, humanity is lost, or the
//! turn limit is hit. The final result is printed to stdout as JSON.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `outbreak-config.yaml` (or `OUTBREAK_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Validate configuration
//! 4. Seed the RNG from `world.seed`
//! 5. Build the model (placing agents for the grid variant)
//! 6. Load the scenario script
//! 7. Run the simulation loop
//! 8. Log the result and print the JSON report

mod error;
mod reporter;
mod spawner;

use std::path::PathBuf;

use outbreak_core::command::ScriptedCommands;
use outbreak_core::config::SimulationConfig;
use outbreak_core::model::OutbreakModel;
use outbreak_core::runner::{self, RunSettings};
use outbreak_core::stock_flow::StockFlowEngine;
use outbreak_core::turn::{GridSettings, TurnEngine};
use outbreak_types::ModelVariant;
use outbreak_world::GridTopology;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::reporter::HudReporter;

/// Environment variable naming the configuration file.
const CONFIG_ENV_VAR: &str = "OUTBREAK_CONFIG";

/// Configuration file used when `OUTBREAK_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "outbreak-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        variant = ?config.model.variant,
        width = config.grid.width,
        height = config.grid.height,
        max_turns = config.simulation.max_turns,
        "Configuration loaded"
    );

    // 3. Validate.
    config.validate().map_err(EngineError::from)?;

    // 4. Seed the RNG.
    let rng = StdRng::seed_from_u64(config.world.seed);

    // 5. Build the model.
    let mut model = build_model(&config, rng)?;
    info!(variant = ?model.variant(), "Model built");

    // 6. Load the scenario script.
    let mut script = ScriptedCommands::from_config(&config.scenario);
    info!(scripted_fences = script.len(), "Scenario loaded");

    // 7. Run the simulation.
    let mut reporter = HudReporter::new();
    let result = runner::run_simulation(
        model.as_mut(),
        RunSettings::from_config(&config),
        &mut script,
        &mut reporter,
    )
    .map_err(EngineError::from)?;

    // 8. Log and print results.
    runner::log_simulation_end(&result);

    let report = serde_json::json!({
        "world": config.world.name,
        "seed": config.world.seed,
        "variant": config.model.variant,
        "peak_infected": reporter.peak_infected(),
        "result": result,
    });
    let rendered = serde_json::to_string_pretty(&report).map_err(EngineError::from)?;
    println!("{rendered}");

    info!(
        end_reason = ?result.end_reason,
        total_turns = result.total_turns,
        "outbreak-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration.
///
/// Reads the file named by `OUTBREAK_CONFIG`, or `outbreak-config.yaml` in
/// the current working directory. A missing file means defaults.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let path = std::env::var_os(CONFIG_ENV_VAR)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        Ok(SimulationConfig::from_file(&path)?)
    } else {
        let mut config = SimulationConfig::default();
        config.world.apply_env_overrides();
        Ok(config)
    }
}

/// Build the configured model variant.
///
/// The grid variant draws its placement from `rng` and then keeps the same
/// stream for the per-turn agent shuffle.
fn build_model(
    config: &SimulationConfig,
    mut rng: StdRng,
) -> Result<Box<dyn OutbreakModel>, EngineError> {
    match config.model.variant {
        ModelVariant::Grid => {
            let grid = GridTopology::new(config.grid.width, config.grid.height)?;
            let placement = spawner::place_agents(&grid, &config.agents, &mut rng)?;
            let engine = TurnEngine::new(
                grid,
                &placement,
                GridSettings::from_config(config)?,
                rng,
            )?;
            Ok(Box::new(engine))
        }
        ModelVariant::StockFlow => Ok(Box::new(StockFlowEngine::from_config(config)?)),
    }
}
