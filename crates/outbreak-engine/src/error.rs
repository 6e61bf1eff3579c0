//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and simulation execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: outbreak_core::config::ConfigError,
    },

    /// Grid construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: outbreak_world::WorldError,
    },

    /// Model construction failed.
    #[error("model error: {source}")]
    Turn {
        /// The underlying turn error.
        #[from]
        source: outbreak_core::model::TurnError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: outbreak_core::runner::RunnerError,
    },

    /// Initial placement failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },

    /// The final report could not be serialized.
    #[error("report error: {source}")]
    Report {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
