//! Configuration loading and typed config structures for the Outbreak
//! simulation.
//!
//! The canonical configuration lives in `outbreak-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, a loader, and a validation pass that rejects values the
//! engines cannot run with.
//!
//! Configuration is read once at start and is static for the rest of the
//! run.

use std::path::Path;

use outbreak_types::{Axis, ModelVariant};
use serde::Deserialize;

/// Environment variable that overrides `world.seed` when loading from file.
pub const SEED_ENV_VAR: &str = "OUTBREAK_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but cannot be simulated.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Which value is wrong and why.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `outbreak-config.yaml`. Every field has a
/// default, so an empty document is a valid grid-variant configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed).
    #[serde(default)]
    pub world: WorldConfig,

    /// Which model fidelity to run.
    #[serde(default)]
    pub model: ModelConfig,

    /// Grid dimensions.
    #[serde(default)]
    pub grid: GridConfig,

    /// Discrete agent counts for the grid variant.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Incubation conveyor settings, shared by both variants.
    #[serde(default)]
    pub incubation: IncubationConfig,

    /// Continuous stocks and rates for the stock-and-flow variant.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Density response table. Required by the stock-and-flow variant.
    #[serde(default)]
    pub density_curve: Option<DensityCurveConfig>,

    /// Containment multiplier settings.
    #[serde(default)]
    pub containment: ContainmentConfig,

    /// Simulation boundary parameters.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scripted player actions for headless runs.
    #[serde(default)]
    pub scenario: ScenarioConfig,

    /// End-of-run scoring.
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `OUTBREAK_SEED`, if set to a valid `u64`, overrides `world.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.world.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Reject values the engines cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid.width, self.grid.height
            ));
        }
        if !self.incubation.delay_turns.is_finite() || self.incubation.delay_turns <= 0.0 {
            return invalid(format!(
                "incubation.delay_turns must be positive, got {}",
                self.incubation.delay_turns
            ));
        }
        if !self.incubation.capacity.is_finite() || self.incubation.capacity < 0.0 {
            return invalid(format!(
                "incubation.capacity must be non-negative, got {}",
                self.incubation.capacity
            ));
        }
        let floor = self.containment.min_multiplier;
        if !(0.0..=1.0).contains(&floor) {
            return invalid(format!(
                "containment.min_multiplier must lie in [0, 1], got {floor}"
            ));
        }

        match self.model.variant {
            ModelVariant::Grid => self.validate_grid(),
            ModelVariant::StockFlow => self.validate_stock_flow(),
        }
    }

    fn validate_grid(&self) -> Result<(), ConfigError> {
        let cells = u64::from(self.grid.width).saturating_mul(u64::from(self.grid.height));
        let population = u64::from(self.agents.initial_susceptible)
            .saturating_add(u64::from(self.agents.initial_infected));
        if population > cells {
            return invalid(format!(
                "{population} agents do not fit on a {}x{} grid",
                self.grid.width, self.grid.height
            ));
        }
        Ok(())
    }

    fn validate_stock_flow(&self) -> Result<(), ConfigError> {
        let population = &self.population;
        for (name, value) in [
            ("population.initial_susceptible", population.initial_susceptible),
            ("population.initial_infected", population.initial_infected),
            ("population.normal_bite_rate", population.normal_bite_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{name} must be non-negative, got {value}"));
            }
        }
        for (name, value) in [
            ("population.land_area", population.land_area),
            ("population.normal_density", population.normal_density),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return invalid(format!("{name} must be positive, got {value}"));
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid { reason })
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable run name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for the agent shuffle and initial placement.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl WorldConfig {
    /// Apply the `OUTBREAK_SEED` override, ignoring unparsable values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(seed) = std::env::var(SEED_ENV_VAR)
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok())
        {
            self.seed = seed;
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
        }
    }
}

/// Model selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ModelConfig {
    /// `grid` (discrete agents) or `stock_flow` (aggregate stocks).
    #[serde(default)]
    pub variant: ModelVariant,
}

/// Grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// Width in cells.
    #[serde(default = "default_grid_side")]
    pub width: u32,

    /// Height in cells.
    #[serde(default = "default_grid_side")]
    pub height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: default_grid_side(),
            height: default_grid_side(),
        }
    }
}

/// Discrete agent settings for the grid variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AgentsConfig {
    /// Susceptible agents placed at start.
    #[serde(default = "default_initial_susceptible_agents")]
    pub initial_susceptible: u32,

    /// Infected agents placed at start.
    #[serde(default = "default_initial_infected_agents")]
    pub initial_infected: u32,

    /// Maximum infected agents that act in one turn.
    #[serde(default = "default_infected_per_turn")]
    pub infected_per_turn: u32,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            initial_susceptible: default_initial_susceptible_agents(),
            initial_infected: default_initial_infected_agents(),
            infected_per_turn: default_infected_per_turn(),
        }
    }
}

/// Incubation conveyor settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct IncubationConfig {
    /// Turns from bite to conversion.
    #[serde(default = "default_delay_turns")]
    pub delay_turns: f64,

    /// Maximum population incubating at once.
    #[serde(default = "default_capacity")]
    pub capacity: f64,
}

impl Default for IncubationConfig {
    fn default() -> Self {
        Self {
            delay_turns: default_delay_turns(),
            capacity: default_capacity(),
        }
    }
}

/// Continuous stocks and rates for the stock-and-flow variant.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Starting susceptible stock.
    #[serde(default = "default_initial_susceptible_stock")]
    pub initial_susceptible: f64,

    /// Starting infected stock.
    #[serde(default = "default_initial_infected_stock")]
    pub initial_infected: f64,

    /// Bites per infected per turn at normal density with no fences.
    #[serde(default = "default_normal_bite_rate")]
    pub normal_bite_rate: f64,

    /// Area the population is spread over.
    #[serde(default = "default_land_area")]
    pub land_area: f64,

    /// Density at which the curve is calibrated to ratio 1.
    #[serde(default = "default_normal_density")]
    pub normal_density: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_susceptible: default_initial_susceptible_stock(),
            initial_infected: default_initial_infected_stock(),
            normal_bite_rate: default_normal_bite_rate(),
            land_area: default_land_area(),
            normal_density: default_normal_density(),
        }
    }
}

/// Density response control points as `[density_ratio, effect]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DensityCurveConfig {
    /// Unsorted control points.
    #[serde(default)]
    pub points: Vec<[f64; 2]>,
}

/// Containment multiplier settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ContainmentConfig {
    /// Floor for `1 - fenced_fraction`.
    #[serde(default = "default_min_multiplier")]
    pub min_multiplier: f64,
}

impl Default for ContainmentConfig {
    fn default() -> Self {
        Self {
            min_multiplier: default_min_multiplier(),
        }
    }
}

/// Simulation boundary parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Stop after this many turns. 0 means unlimited.
    #[serde(default = "default_max_turns")]
    pub max_turns: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Scripted fence placements for headless runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScenarioConfig {
    /// Fences to place, each before the turn of its `day`.
    #[serde(default)]
    pub fences: Vec<FenceScript>,
}

/// One scripted fence placement.
///
/// With `axis` set, `index` addresses that axis's edge array. Without it,
/// `index` is a flat edge id (horizontal edges first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FenceScript {
    /// Placed before the turn that resolves this day (first turn is day 1).
    pub day: u64,

    /// Edge axis, or `None` for a flat id.
    #[serde(default)]
    pub axis: Option<Axis>,

    /// Edge index or flat id.
    pub index: u32,
}

/// End-of-run scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScoringConfig {
    /// Points per susceptible survivor when the outbreak is contained.
    #[serde(default = "default_score_multiplier")]
    pub multiplier: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            multiplier: default_score_multiplier(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Outbreak".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_grid_side() -> u32 {
    10
}

const fn default_initial_susceptible_agents() -> u32 {
    20
}

const fn default_initial_infected_agents() -> u32 {
    1
}

const fn default_infected_per_turn() -> u32 {
    3
}

const fn default_delay_turns() -> f64 {
    3.0
}

const fn default_capacity() -> f64 {
    100.0
}

const fn default_initial_susceptible_stock() -> f64 {
    100.0
}

const fn default_initial_infected_stock() -> f64 {
    1.0
}

const fn default_normal_bite_rate() -> f64 {
    1.0
}

const fn default_land_area() -> f64 {
    100.0
}

const fn default_normal_density() -> f64 {
    1.0
}

const fn default_min_multiplier() -> f64 {
    0.5
}

const fn default_max_turns() -> u64 {
    200
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_score_multiplier() -> u64 {
    100
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.grid.width, 10);
        assert_eq!(config.agents.infected_per_turn, 3);
        assert_eq!(config.model.variant, ModelVariant::Grid);
        assert!(config.density_curve.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = SimulationConfig::parse("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
world:
  name: Test Town
  seed: 7
model:
  variant: stock_flow
grid:
  width: 5
  height: 4
agents:
  initial_susceptible: 6
  initial_infected: 2
  infected_per_turn: 1
incubation:
  delay_turns: 2
  capacity: 10
population:
  initial_susceptible: 500
  initial_infected: 3
  normal_bite_rate: 0.8
  land_area: 250
  normal_density: 2
density_curve:
  points:
    - [0.0, 0.0]
    - [1.0, 1.0]
    - [2.0, 1.5]
containment:
  min_multiplier: 0.25
simulation:
  max_turns: 30
logging:
  level: debug
scenario:
  fences:
    - { day: 1, axis: vertical, index: 3 }
    - { day: 2, index: 17 }
scoring:
  multiplier: 10
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.world.name, "Test Town");
        assert_eq!(config.model.variant, ModelVariant::StockFlow);
        assert_eq!(config.grid.height, 4);
        assert_eq!(config.incubation.delay_turns, 2.0);
        assert_eq!(config.population.land_area, 250.0);
        assert_eq!(config.density_curve.as_ref().map(|c| c.points.len()), Some(3));
        assert_eq!(config.containment.min_multiplier, 0.25);
        assert_eq!(config.simulation.max_turns, 30);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.scenario.fences.len(), 2);
        assert_eq!(config.scenario.fences[0].axis, Some(Axis::Vertical));
        assert_eq!(config.scenario.fences[1].axis, None);
        assert_eq!(config.scoring.multiplier, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let zero_grid = SimulationConfig::parse("grid: { width: 0 }").unwrap();
        assert!(matches!(zero_grid.validate(), Err(ConfigError::Invalid { .. })));

        let bad_delay = SimulationConfig::parse("incubation: { delay_turns: 0 }").unwrap();
        assert!(bad_delay.validate().is_err());

        let bad_floor = SimulationConfig::parse("containment: { min_multiplier: 1.5 }").unwrap();
        assert!(bad_floor.validate().is_err());

        let crowded =
            SimulationConfig::parse("grid: { width: 2, height: 2 }\nagents: { initial_susceptible: 4 }")
                .unwrap();
        assert!(crowded.validate().is_err());

        let bad_area =
            SimulationConfig::parse("model: { variant: stock_flow }\npopulation: { land_area: 0 }")
                .unwrap();
        assert!(bad_area.validate().is_err());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            SimulationConfig::parse("grid: [not, a, map"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn shipped_config_parses_and_validates() {
        let config =
            SimulationConfig::parse(include_str!("../../../outbreak-config.yaml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.scenario.fences.len(), 3);
        assert!(config.density_curve.is_some());
        assert_eq!(config.scoring.multiplier, 100);
    }
}
