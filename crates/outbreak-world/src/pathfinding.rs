//! Breadth-first shortest paths over the fenced grid.
//!
//! Every step has unit cost, so BFS is optimal. Neighbors are expanded in
//! West, East, North, South order; that order is the only tie-break between
//! equal-length paths and keeps runs reproducible.
//!
//! Occupancy is ignored here. A path may cross cells holding other agents;
//! whether the first step can actually be taken is the turn engine's call.

use std::collections::VecDeque;

use outbreak_types::Cell;

use crate::grid::GridTopology;

/// Shortest-path queries against a borrowed grid.
#[derive(Debug, Clone, Copy)]
pub struct PathFinder<'a> {
    grid: &'a GridTopology,
}

impl<'a> PathFinder<'a> {
    /// Create a path finder over `grid`.
    pub const fn new(grid: &'a GridTopology) -> Self {
        Self { grid }
    }

    /// Shortest path from `start` to `goal`, both inclusive.
    ///
    /// Returns `None` if either endpoint is off-grid or `goal` is
    /// unreachable. `start == goal` yields `[start]`.
    pub fn shortest_path(&self, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
        let goal_slot = self.grid.index_of(goal)?;
        let field = self.search(start, Some(goal_slot))?;
        field.path_to(goal)
    }

    /// Whether `goal` can be reached from `start`.
    pub fn is_reachable(&self, start: Cell, goal: Cell) -> bool {
        let Some(goal_slot) = self.grid.index_of(goal) else {
            return false;
        };
        self.search(start, Some(goal_slot))
            .is_some_and(|field| field.distance(goal).is_some())
    }

    /// Whether any of `goals` can be reached from `start`.
    pub fn any_reachable(&self, start: Cell, goals: &[Cell]) -> bool {
        if goals.is_empty() {
            return false;
        }
        self.distances_from(start)
            .is_some_and(|field| goals.iter().any(|&goal| field.distance(goal).is_some()))
    }

    /// Full BFS from `origin`: distance and predecessor for every cell.
    ///
    /// Returns `None` if `origin` is off-grid.
    pub fn distances_from(&self, origin: Cell) -> Option<DistanceField<'a>> {
        self.search(origin, None)
    }

    /// BFS from `origin`, stopping early once `stop_at` is dequeued.
    fn search(&self, origin: Cell, stop_at: Option<usize>) -> Option<DistanceField<'a>> {
        let origin_slot = self.grid.index_of(origin)?;
        let cell_count = self.grid.cell_count();

        let mut distance: Vec<Option<u32>> = vec![None; cell_count];
        let mut parent: Vec<Option<usize>> = vec![None; cell_count];
        let mut queue = VecDeque::new();

        *distance.get_mut(origin_slot)? = Some(0);
        queue.push_back((origin, origin_slot));

        while let Some((current, current_slot)) = queue.pop_front() {
            if stop_at == Some(current_slot) {
                break;
            }
            let Some(next_distance) = distance
                .get(current_slot)
                .copied()
                .flatten()
                .and_then(|d| d.checked_add(1))
            else {
                continue;
            };

            for neighbor in self.grid.neighbors(current) {
                let Some(slot) = self.grid.index_of(neighbor) else {
                    continue;
                };
                let Some(seen) = distance.get_mut(slot) else {
                    continue;
                };
                if seen.is_some() {
                    continue;
                }
                *seen = Some(next_distance);
                if let Some(link) = parent.get_mut(slot) {
                    *link = Some(current_slot);
                }
                queue.push_back((neighbor, slot));
            }
        }

        Some(DistanceField {
            grid: self.grid,
            origin,
            origin_slot,
            distance,
            parent,
        })
    }
}

/// Result of a BFS from one origin cell.
#[derive(Debug, Clone)]
pub struct DistanceField<'a> {
    grid: &'a GridTopology,
    origin: Cell,
    origin_slot: usize,
    distance: Vec<Option<u32>>,
    parent: Vec<Option<usize>>,
}

impl DistanceField<'_> {
    /// The cell the search started from.
    pub const fn origin(&self) -> Cell {
        self.origin
    }

    /// Steps from the origin to `cell`, or `None` if unreachable or off-grid.
    pub fn distance(&self, cell: Cell) -> Option<u32> {
        let slot = self.grid.index_of(cell)?;
        self.distance.get(slot).copied().flatten()
    }

    /// Number of cells reachable from the origin, itself included.
    pub fn reachable_count(&self) -> usize {
        self.distance.iter().filter(|d| d.is_some()).count()
    }

    /// The nearest of `candidates`. Ties go to the earliest candidate.
    pub fn nearest<'c, I>(&self, candidates: I) -> Option<(Cell, u32)>
    where
        I: IntoIterator<Item = &'c Cell>,
    {
        let mut best: Option<(Cell, u32)> = None;
        for &candidate in candidates {
            let Some(d) = self.distance(candidate) else {
                continue;
            };
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((candidate, d));
            }
        }
        best
    }

    /// Walk predecessors back from `goal` to build the origin-to-goal path.
    pub fn path_to(&self, goal: Cell) -> Option<Vec<Cell>> {
        let goal_slot = self.grid.index_of(goal)?;
        self.distance.get(goal_slot).copied().flatten()?;

        let mut path = VecDeque::new();
        path.push_front(goal);
        let mut current = goal_slot;
        while current != self.origin_slot {
            let previous = self.parent.get(current).copied().flatten()?;
            path.push_front(self.grid.cell_at(previous)?);
            current = previous;
        }
        Some(path.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
mod tests {
    use outbreak_types::{Direction, EdgeRef};

    use super::*;

    fn grid(width: u32, height: u32) -> GridTopology {
        GridTopology::new(width, height).unwrap()
    }

    fn assert_walkable(g: &GridTopology, path: &[Cell]) {
        for pair in path.windows(2) {
            assert!(g.can_move(pair[0], pair[1]), "illegal step {} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn corner_to_corner_on_open_5x5() {
        let g = grid(5, 5);
        let path = PathFinder::new(&g)
            .shortest_path(Cell::new(0, 0), Cell::new(4, 4))
            .unwrap();
        assert_eq!(path.len(), 9);
        assert_eq!(path.first(), Some(&Cell::new(0, 0)));
        assert_eq!(path.last(), Some(&Cell::new(4, 4)));
        assert_walkable(&g, &path);
    }

    #[test]
    fn west_east_first_tie_break() {
        let g = grid(3, 3);
        let path = PathFinder::new(&g)
            .shortest_path(Cell::new(0, 0), Cell::new(1, 1))
            .unwrap();
        // East is expanded before South, so the path goes along the row first.
        assert_eq!(path, vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(1, 1)]);
    }

    #[test]
    fn same_cell_path_is_singleton() {
        let g = grid(2, 2);
        let path = PathFinder::new(&g).shortest_path(Cell::new(1, 1), Cell::new(1, 1));
        assert_eq!(path, Some(vec![Cell::new(1, 1)]));
    }

    #[test]
    fn two_fences_isolate_a_corner() {
        let mut g = grid(5, 5);
        let corner = Cell::new(0, 0);
        let _ = g.place_fence_at(corner, Direction::East);
        let _ = g.place_fence_at(corner, Direction::South);
        let finder = PathFinder::new(&g);
        assert!(finder.shortest_path(Cell::new(4, 4), corner).is_none());
        assert!(!finder.is_reachable(corner, Cell::new(1, 0)));
        assert_eq!(finder.distances_from(corner).unwrap().reachable_count(), 1);
    }

    #[test]
    fn fence_forces_detour() {
        let mut g = grid(3, 2);
        let _ = g.place_fence_at(Cell::new(0, 0), Direction::East);
        let path = PathFinder::new(&g)
            .shortest_path(Cell::new(0, 0), Cell::new(1, 0))
            .unwrap();
        assert_eq!(
            path,
            vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 1), Cell::new(1, 0)]
        );
    }

    #[test]
    fn invalid_endpoints_have_no_path() {
        let g = grid(3, 3);
        let finder = PathFinder::new(&g);
        assert!(finder.shortest_path(Cell::new(-1, 0), Cell::new(1, 1)).is_none());
        assert!(finder.shortest_path(Cell::new(0, 0), Cell::new(3, 0)).is_none());
        assert!(finder.distances_from(Cell::new(0, 9)).is_none());
    }

    #[test]
    fn nearest_prefers_earliest_on_tie() {
        let g = grid(5, 1);
        let field = PathFinder::new(&g).distances_from(Cell::new(2, 0)).unwrap();
        let candidates = [Cell::new(4, 0), Cell::new(0, 0), Cell::new(3, 0)];
        assert_eq!(field.nearest(&candidates), Some((Cell::new(3, 0), 1)));
        let tied = [Cell::new(4, 0), Cell::new(0, 0)];
        assert_eq!(field.nearest(&tied), Some((Cell::new(4, 0), 2)));
    }

    #[test]
    fn any_reachable_checks_all_goals() {
        let mut g = grid(3, 1);
        let _ = g.place_fence_at(Cell::new(0, 0), Direction::East);
        let finder = PathFinder::new(&g);
        assert!(!finder.any_reachable(Cell::new(0, 0), &[Cell::new(1, 0), Cell::new(2, 0)]));
        assert!(finder.any_reachable(Cell::new(2, 0), &[Cell::new(0, 0), Cell::new(1, 0)]));
        assert!(!finder.any_reachable(Cell::new(2, 0), &[]));
    }

    /// All-pairs distances by Floyd-Warshall, as an independent oracle.
    fn floyd_warshall(g: &GridTopology) -> Vec<Vec<Option<u32>>> {
        let n = g.cell_count();
        let mut d = vec![vec![None; n]; n];
        for (i, row) in d.iter_mut().enumerate() {
            row[i] = Some(0);
            let a = g.cell_at(i).unwrap();
            for b in g.neighbors(a) {
                row[g.index_of(b).unwrap()] = Some(1);
            }
        }
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    if let (Some(ik), Some(kj)) = (d[i][k], d[k][j]) {
                        let via = ik + kj;
                        if d[i][j].is_none_or(|cur| via < cur) {
                            d[i][j] = Some(via);
                        }
                    }
                }
            }
        }
        d
    }

    #[test]
    fn bfs_matches_brute_force_over_all_interior_fence_masks() {
        // A 3x3 grid has 12 interior edges: horizontal rows 1..=2 and
        // vertical columns 1..=2.
        let template = grid(3, 3);
        let layer = template.fences();
        let mut interior: Vec<EdgeRef> = Vec::new();
        for y in 1..=2 {
            for x in 0..3 {
                interior.push(layer.horizontal_at(x, y).unwrap());
            }
        }
        for y in 0..3 {
            for x in 1..=2 {
                interior.push(layer.vertical_at(x, y).unwrap());
            }
        }
        assert_eq!(interior.len(), 12);

        for mask in 0_u32..(1 << interior.len()) {
            let mut g = template.clone();
            for (bit, &edge) in interior.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    let _ = g.place_fence(edge);
                }
            }
            let oracle = floyd_warshall(&g);
            let finder = PathFinder::new(&g);
            for i in 0..g.cell_count() {
                for j in 0..g.cell_count() {
                    let (a, b) = (g.cell_at(i).unwrap(), g.cell_at(j).unwrap());
                    let path = finder.shortest_path(a, b);
                    match oracle[i][j] {
                        None => assert!(path.is_none(), "mask {mask}: {a}->{b} should be cut"),
                        Some(steps) => {
                            let path = path.unwrap();
                            assert_eq!(path.len() as u32, steps + 1, "mask {mask}: {a}->{b}");
                            assert_walkable(&g, &path);
                        }
                    }
                }
            }
        }
    }
}
