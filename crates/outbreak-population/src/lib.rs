//! Population dynamics for the Outbreak simulation.
//!
//! This crate holds the pieces of the model that move population between
//! stocks over time, independent of any grid:
//!
//! - [`curve`] -- The [`DensityResponseCurve`]: piecewise-linear lookup from
//!   density ratio to bite-rate multiplier.
//! - [`conveyor`] -- The [`IncubationConveyor`]: a capacity-limited delay
//!   line that turns bitten population into infected after a fixed number
//!   of turns.
//! - [`conservation`] -- Per-turn verification that the total population
//!   is unchanged.
//!
//! # Usage
//!
//! ```
//! use outbreak_population::IncubationConveyor;
//!
//! let mut conveyor: IncubationConveyor = IncubationConveyor::new();
//! let accepted = conveyor.try_enqueue(5.0, 2.0, 3.0);
//! assert!((accepted - 3.0).abs() < f64::EPSILON);
//!
//! assert!(conveyor.advance().batches.is_empty());
//! assert!((conveyor.advance().amount - 3.0).abs() < f64::EPSILON);
//! ```

pub mod conservation;
pub mod conveyor;
pub mod curve;

// Re-export primary types at crate root.
pub use conservation::{ConservationResult, verify_conservation};
pub use conveyor::{ConveyorBatch, IncubationConveyor, IncubationSettings, Outflow};
pub use curve::{CurvePoint, DensityResponseCurve};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while loading the density response curve.
#[derive(Debug, thiserror::Error)]
pub enum CurveError {
    /// The aggregate model needs a curve and none was configured.
    #[error("density response curve is missing")]
    Missing,

    /// A control point has a NaN or infinite coordinate.
    #[error("density response curve point ({density_ratio}, {effect}) is not finite")]
    NonFinite {
        /// The offending ratio.
        density_ratio: f64,
        /// The offending effect.
        effect: f64,
    },
}

/// Errors raised while configuring the incubation conveyor.
#[derive(Debug, thiserror::Error)]
pub enum ConveyorError {
    /// Delay must be finite and positive.
    #[error("incubation delay must be a positive number of turns, got {0}")]
    InvalidDelay(f64),

    /// Capacity must be finite and non-negative.
    #[error("incubation capacity must be non-negative, got {0}")]
    InvalidCapacity(f64),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation violation detected after a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationAnomaly {
    /// The turn that drifted.
    pub turn: u64,
    /// Total population before the turn.
    pub total_before: f64,
    /// Total population after the turn.
    pub total_after: f64,
    /// Human-readable description.
    pub message: String,
}

impl core::fmt::Display for PopulationAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
