//! Player command sources.
//!
//! Between turns the player may place any number of fences. The
//! [`CommandSource`] trait abstracts where those commands come from -- an
//! interactive front end, a scripted scenario, or a test stub. The run loop
//! asks for the commands of a day before resolving that day's turn.

use std::collections::BTreeMap;

use outbreak_types::{Axis, EdgeRef, FenceOutcome};
use tracing::debug;

use crate::config::ScenarioConfig;
use crate::model::OutbreakModel;

/// One player command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Fence an edge addressed by axis and index.
    PlaceFence(EdgeRef),
    /// Fence an edge addressed by flat id.
    PlaceFenceId(u32),
}

impl PlayerCommand {
    /// Apply this command to `model`.
    pub fn apply(self, model: &mut dyn OutbreakModel) -> FenceOutcome {
        match self {
            Self::PlaceFence(edge) => model.place_fence(edge),
            Self::PlaceFenceId(id) => model.place_fence_by_id(id),
        }
    }
}

/// A source of player commands.
pub trait CommandSource {
    /// Commands to apply before the turn that resolves `day`.
    fn commands_for(&mut self, day: u64) -> Vec<PlayerCommand>;
}

/// A command source that never places a fence.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleCommands;

impl CommandSource for IdleCommands {
    fn commands_for(&mut self, _day: u64) -> Vec<PlayerCommand> {
        Vec::new()
    }
}

/// Fence placements keyed by day, replayed in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCommands {
    by_day: BTreeMap<u64, Vec<PlayerCommand>>,
}

impl ScriptedCommands {
    /// An empty script.
    pub const fn new() -> Self {
        Self {
            by_day: BTreeMap::new(),
        }
    }

    /// Build a script from the `scenario` config section.
    pub fn from_config(scenario: &ScenarioConfig) -> Self {
        let mut script = Self::new();
        for fence in &scenario.fences {
            let command = match fence.axis {
                Some(Axis::Horizontal) => {
                    PlayerCommand::PlaceFence(EdgeRef::horizontal(fence.index))
                }
                Some(Axis::Vertical) => PlayerCommand::PlaceFence(EdgeRef::vertical(fence.index)),
                None => PlayerCommand::PlaceFenceId(fence.index),
            };
            script.push(fence.day, command);
        }
        debug!(
            days = script.by_day.len(),
            commands = script.len(),
            "Scenario script loaded"
        );
        script
    }

    /// Schedule `command` before the turn of `day`.
    pub fn push(&mut self, day: u64, command: PlayerCommand) {
        self.by_day.entry(day).or_default().push(command);
    }

    /// Total scheduled commands not yet handed out.
    pub fn len(&self) -> usize {
        self.by_day.values().map(Vec::len).sum()
    }

    /// Whether nothing is left to hand out.
    pub fn is_empty(&self) -> bool {
        self.by_day.is_empty()
    }
}

impl CommandSource for ScriptedCommands {
    fn commands_for(&mut self, day: u64) -> Vec<PlayerCommand> {
        self.by_day.remove(&day).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    #[test]
    fn script_hands_out_each_day_once() {
        let config = SimulationConfig::parse(
            "scenario:\n  fences:\n    - { day: 1, index: 4 }\n    - { day: 1, axis: vertical, index: 2 }\n    - { day: 3, axis: horizontal, index: 0 }\n",
        )
        .unwrap();
        let mut script = ScriptedCommands::from_config(&config.scenario);
        assert_eq!(script.len(), 3);

        assert_eq!(
            script.commands_for(1),
            vec![
                PlayerCommand::PlaceFenceId(4),
                PlayerCommand::PlaceFence(EdgeRef::vertical(2)),
            ]
        );
        assert!(script.commands_for(1).is_empty());
        assert!(script.commands_for(2).is_empty());
        assert_eq!(
            script.commands_for(3),
            vec![PlayerCommand::PlaceFence(EdgeRef::horizontal(0))]
        );
        assert!(script.is_empty());
    }

    #[test]
    fn idle_source_is_empty() {
        assert!(IdleCommands.commands_for(7).is_empty());
    }
}
