//! Initial placement of the grid variant's population.
//!
//! Every cell of the grid is shuffled once with the seeded RNG. The first
//! `initial_susceptible` cells of the shuffle receive susceptible agents.
//! Each infected agent is then dropped on a uniformly random cell among
//! those still empty.

use outbreak_core::config::AgentsConfig;
use outbreak_core::shuffle;
use outbreak_types::{Cell, Placement};
use outbreak_world::GridTopology;
use rand::Rng;
use tracing::info;

use crate::error::EngineError;

/// Choose starting cells for the configured agents.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if the grid has fewer cells than the
/// configured population.
pub fn place_agents<R: Rng + ?Sized>(
    grid: &GridTopology,
    agents: &AgentsConfig,
    rng: &mut R,
) -> Result<Placement, EngineError> {
    let susceptible_count = to_count(agents.initial_susceptible)?;
    let infected_count = to_count(agents.initial_infected)?;
    let needed = susceptible_count
        .checked_add(infected_count)
        .ok_or_else(|| spawner_error("population size overflows"))?;
    if needed > grid.cell_count() {
        return Err(spawner_error(&format!(
            "{needed} agents do not fit on {} cells",
            grid.cell_count()
        )));
    }

    let mut cells: Vec<Cell> = grid.all_cells().collect();
    shuffle::fisher_yates(&mut cells, rng);
    let mut empty = cells.split_off(susceptible_count);
    let susceptible = cells;

    let mut infected = Vec::with_capacity(infected_count);
    for _ in 0..infected_count {
        let pick = rng.random_range(0..empty.len());
        infected.push(empty.swap_remove(pick));
    }

    info!(
        susceptible = susceptible.len(),
        infected = infected.len(),
        free_cells = empty.len(),
        "Initial population placed"
    );
    Ok(Placement {
        susceptible,
        infected,
    })
}

fn to_count(value: u32) -> Result<usize, EngineError> {
    usize::try_from(value).map_err(|e| spawner_error(&format!("agent count {value}: {e}")))
}

fn spawner_error(message: &str) -> EngineError {
    EngineError::Spawner {
        message: message.to_owned(),
    }
}
