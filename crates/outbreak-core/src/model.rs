//! The interface both model variants expose to the run loop.
//!
//! A model owns its grid, its population state, and its turn state machine:
//!
//! ```text
//! AwaitingPlayerAction --advance_turn--> ResolvingTurn --+--> Terminal(Contained | Lost)
//!          ^                                             |
//!          +---------------------------------------------+
//! ```
//!
//! `advance_turn` is the only transition out of `AwaitingPlayerAction`.
//! It is rejected while a turn is resolving (a turn that failed part-way
//! leaves the model there) and once a terminal state is reached.

use outbreak_types::{
    EdgeRef, FenceOutcome, ModelVariant, Occupant, Outcome, StatusView, TurnPhase, TurnReport,
};
use outbreak_world::{GridTopology, WorldError};

use crate::arena::ArenaError;
use crate::clock::ClockError;

/// Errors that can occur while building a model or resolving a turn.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// `advance_turn` was called while a turn was already resolving.
    #[error("a turn is already being resolved")]
    TurnInProgress,

    /// `advance_turn` was called after the simulation ended.
    #[error("simulation already ended: {outcome}")]
    AlreadyTerminal {
        /// The terminal verdict.
        outcome: Outcome,
    },

    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A grid operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// An agent arena operation failed.
    #[error("arena error: {source}")]
    Arena {
        /// The underlying arena error.
        #[from]
        source: ArenaError,
    },

    /// The density response curve could not be built.
    #[error("curve error: {source}")]
    Curve {
        /// The underlying curve error.
        #[from]
        source: outbreak_population::CurveError,
    },

    /// The incubation settings are invalid.
    #[error("conveyor error: {source}")]
    Conveyor {
        /// The underlying conveyor error.
        #[from]
        source: outbreak_population::ConveyorError,
    },

    /// The initial placement does not fit the grid.
    #[error("invalid placement: {reason}")]
    InvalidPlacement {
        /// What is wrong with the placement.
        reason: String,
    },
}

/// Common surface of the grid and stock-and-flow models.
pub trait OutbreakModel {
    /// Which variant this is.
    fn variant(&self) -> ModelVariant;

    /// Fence an edge. Idempotent; out-of-range edges are ignored.
    fn place_fence(&mut self, edge: EdgeRef) -> FenceOutcome;

    /// Fence an edge addressed by flat id.
    fn place_fence_by_id(&mut self, id: u32) -> FenceOutcome;

    /// Resolve one turn.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::TurnInProgress`] or [`TurnError::AlreadyTerminal`]
    /// if the phase does not allow a turn, or the underlying error if
    /// resolution fails part-way.
    fn advance_turn(&mut self) -> Result<TurnReport, TurnError>;

    /// Current state machine phase.
    fn phase(&self) -> TurnPhase;

    /// HUD snapshot.
    fn status(&self) -> StatusView;

    /// The grid, for per-cell rendering and fence inspection.
    fn grid(&self) -> &GridTopology;

    /// Row-major occupant tags.
    fn occupancy(&self) -> &[Occupant] {
        self.grid().occupancy()
    }
}

/// Enter `ResolvingTurn` if the phase allows a turn.
pub(crate) fn begin_turn(phase: &mut TurnPhase) -> Result<(), TurnError> {
    match *phase {
        TurnPhase::AwaitingPlayerAction => {
            *phase = TurnPhase::ResolvingTurn;
            Ok(())
        }
        TurnPhase::ResolvingTurn => Err(TurnError::TurnInProgress),
        TurnPhase::Terminal(outcome) => Err(TurnError::AlreadyTerminal { outcome }),
    }
}

/// Leave `ResolvingTurn` for the phase `outcome` implies.
pub(crate) const fn finish_turn(outcome: Option<Outcome>) -> TurnPhase {
    match outcome {
        Some(outcome) => TurnPhase::Terminal(outcome),
        None => TurnPhase::AwaitingPlayerAction,
    }
}

/// Convert an agent count to a stock value.
pub(crate) fn count_as_stock(count: usize) -> f64 {
    u32::try_from(count).map_or(f64::from(u32::MAX), f64::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_gate_rejects_reentry_and_terminal() {
        let mut phase = TurnPhase::AwaitingPlayerAction;
        assert!(begin_turn(&mut phase).is_ok());
        assert_eq!(phase, TurnPhase::ResolvingTurn);
        assert!(matches!(begin_turn(&mut phase), Err(TurnError::TurnInProgress)));

        let mut ended = TurnPhase::Terminal(Outcome::Lost);
        assert!(matches!(
            begin_turn(&mut ended),
            Err(TurnError::AlreadyTerminal {
                outcome: Outcome::Lost
            })
        ));
    }

    #[test]
    fn finish_maps_outcome_to_phase() {
        assert_eq!(finish_turn(None), TurnPhase::AwaitingPlayerAction);
        assert_eq!(
            finish_turn(Some(Outcome::Contained)),
            TurnPhase::Terminal(Outcome::Contained)
        );
    }
}
