//! Agent arena for the grid variant.
//!
//! Agents are records in a contiguous `Vec` addressed by [`AgentId`]. Ids
//! are handed out monotonically and never reused; retiring an agent clears
//! its `active` flag and frees its cell but keeps the record, so ids held
//! in reports stay resolvable. A cell index maps each occupied cell to the
//! active agent standing on it.

use std::collections::BTreeMap;

use outbreak_types::{AgentId, AgentKind, Cell};

/// Errors that can occur during arena operations.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// More than `u32::MAX` agents were spawned.
    #[error("agent id space exhausted")]
    IdSpaceExhausted,

    /// The id does not name an active agent.
    #[error("agent {0} is not active")]
    UnknownAgent(AgentId),

    /// Another active agent already stands on the cell.
    #[error("cell {cell} is already occupied by agent {occupant}")]
    CellOccupied {
        /// The contested cell.
        cell: Cell,
        /// The agent already there.
        occupant: AgentId,
    },
}

/// One agent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentRecord {
    /// Stable identifier, equal to the arena slot.
    pub id: AgentId,
    /// Population class.
    pub kind: AgentKind,
    /// Current cell.
    pub cell: Cell,
    /// Cleared on retirement.
    pub active: bool,
}

/// Contiguous agent storage with a cell index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentArena {
    records: Vec<AgentRecord>,
    by_cell: BTreeMap<Cell, AgentId>,
}

impl AgentArena {
    /// An empty arena.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
            by_cell: BTreeMap::new(),
        }
    }

    /// Add an active agent on `cell`.
    pub fn spawn(&mut self, kind: AgentKind, cell: Cell) -> Result<AgentId, ArenaError> {
        if let Some(&occupant) = self.by_cell.get(&cell) {
            return Err(ArenaError::CellOccupied { cell, occupant });
        }
        let raw = u32::try_from(self.records.len()).map_err(|_err| ArenaError::IdSpaceExhausted)?;
        let id = AgentId::new(raw);
        self.records.push(AgentRecord {
            id,
            kind,
            cell,
            active: true,
        });
        self.by_cell.insert(cell, id);
        Ok(id)
    }

    /// Look up a record, active or retired.
    pub fn get(&self, id: AgentId) -> Option<&AgentRecord> {
        self.records.get(id.slot())
    }

    /// Look up an active record.
    pub fn active(&self, id: AgentId) -> Option<&AgentRecord> {
        self.get(id).filter(|record| record.active)
    }

    fn active_mut(&mut self, id: AgentId) -> Result<&mut AgentRecord, ArenaError> {
        self.records
            .get_mut(id.slot())
            .filter(|record| record.active)
            .ok_or(ArenaError::UnknownAgent(id))
    }

    /// The active agent on `cell`.
    pub fn agent_at(&self, cell: Cell) -> Option<AgentId> {
        self.by_cell.get(&cell).copied()
    }

    /// Change an active agent's population class.
    pub fn set_kind(&mut self, id: AgentId, kind: AgentKind) -> Result<(), ArenaError> {
        self.active_mut(id)?.kind = kind;
        Ok(())
    }

    /// Move an active agent to an unoccupied cell.
    pub fn move_to(&mut self, id: AgentId, to: Cell) -> Result<(), ArenaError> {
        if let Some(&occupant) = self.by_cell.get(&to) {
            if occupant == id {
                return Ok(());
            }
            return Err(ArenaError::CellOccupied { cell: to, occupant });
        }
        let record = self.active_mut(id)?;
        let from = record.cell;
        record.cell = to;
        self.by_cell.remove(&from);
        self.by_cell.insert(to, id);
        Ok(())
    }

    /// Retire an active agent and free its cell. Returns the final record.
    pub fn retire(&mut self, id: AgentId) -> Result<AgentRecord, ArenaError> {
        let record = self.active_mut(id)?;
        record.active = false;
        let snapshot = *record;
        self.by_cell.remove(&snapshot.cell);
        Ok(snapshot)
    }

    /// Number of active agents of `kind`.
    pub fn count(&self, kind: AgentKind) -> usize {
        self.records
            .iter()
            .filter(|record| record.active && record.kind == kind)
            .count()
    }

    /// Active agents of `kind`, in id order.
    pub fn ids_of(&self, kind: AgentKind) -> Vec<AgentId> {
        self.records
            .iter()
            .filter(|record| record.active && record.kind == kind)
            .map(|record| record.id)
            .collect()
    }

    /// Total records ever spawned, retired included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was ever spawned.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut arena = AgentArena::new();
        let a = arena.spawn(AgentKind::Susceptible, Cell::new(0, 0)).unwrap();
        let b = arena.spawn(AgentKind::Infected, Cell::new(1, 0)).unwrap();
        let _ = arena.retire(a).unwrap();
        let c = arena.spawn(AgentKind::Infected, Cell::new(0, 0)).unwrap();
        assert_eq!((a.into_inner(), b.into_inner(), c.into_inner()), (0, 1, 2));
        assert!(arena.active(a).is_none());
        assert!(arena.get(a).is_some());
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn cell_index_follows_moves_and_retirement() {
        let mut arena = AgentArena::new();
        let a = arena.spawn(AgentKind::Infected, Cell::new(0, 0)).unwrap();
        arena.move_to(a, Cell::new(0, 1)).unwrap();
        assert_eq!(arena.agent_at(Cell::new(0, 0)), None);
        assert_eq!(arena.agent_at(Cell::new(0, 1)), Some(a));
        let record = arena.retire(a).unwrap();
        assert_eq!(record.cell, Cell::new(0, 1));
        assert_eq!(arena.agent_at(Cell::new(0, 1)), None);
    }

    #[test]
    fn occupied_cells_are_rejected() {
        let mut arena = AgentArena::new();
        let a = arena.spawn(AgentKind::Infected, Cell::new(0, 0)).unwrap();
        let b = arena.spawn(AgentKind::Susceptible, Cell::new(1, 0)).unwrap();
        assert!(matches!(
            arena.spawn(AgentKind::Susceptible, Cell::new(0, 0)),
            Err(ArenaError::CellOccupied { .. })
        ));
        assert!(arena.move_to(a, Cell::new(1, 0)).is_err());
        assert!(arena.move_to(b, Cell::new(1, 0)).is_ok());
    }

    #[test]
    fn counts_track_kind_changes() {
        let mut arena = AgentArena::new();
        let a = arena.spawn(AgentKind::Susceptible, Cell::new(0, 0)).unwrap();
        let _ = arena.spawn(AgentKind::Susceptible, Cell::new(1, 0)).unwrap();
        arena.set_kind(a, AgentKind::Incubating).unwrap();
        assert_eq!(arena.count(AgentKind::Susceptible), 1);
        assert_eq!(arena.ids_of(AgentKind::Incubating), vec![a]);
        let _ = arena.retire(a).unwrap();
        assert!(matches!(arena.set_kind(a, AgentKind::Infected), Err(ArenaError::UnknownAgent(_))));
    }
}
