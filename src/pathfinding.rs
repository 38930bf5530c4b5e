use crate::grid::{Grid, NEIGHBOR_OFFSETS};
use crate::raycast::line_of_sight;
use crate::spatial::ActorIndex;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

/// Field value of cells the flood fill never reached
pub const UNREACHED: i32 = i32::MAX;

/// Crowding radius of the steering occupancy penalty. An agent within
/// manhattan distance `OCCUPANCY_SPAN - 1` of a candidate cell makes it less
/// attractive by `span - distance`. Empirically tuned; `ApproachMap` carries
/// it as an adjustable field.
pub const OCCUPANCY_SPAN: i32 = 4;

/// How many chain cells `steer` blends into its direction
pub const LOOKAHEAD_CELLS: usize = 5;

/// Decay factor of the lookahead weights `1 / (i * falloff + 1)`
pub const LOOKAHEAD_FALLOFF: f32 = 0.75;

/// A position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Calculate Euclidean distance squared (avoid sqrt for performance)
    pub fn distance_squared(&self, other: &Position) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Calculate Euclidean distance
    pub fn distance(&self, other: &Position) -> f64 {
        ((self.distance_squared(other)) as f64).sqrt()
    }
}

/// A node in the A* open queue
#[derive(Debug, Clone)]
struct PathNode {
    position: Position,
    /// Steps walked from the start (uniform cost, diagonals included)
    steps: i32,
    /// steps + Euclidean heuristic to the goal
    score: f64,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.position == other.position
    }
}

impl Eq for PathNode {}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default);
        // row then column make equal scores pop deterministically
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.position.y.cmp(&self.position.y))
            .then_with(|| other.position.x.cmp(&self.position.x))
    }
}

/// One A* step toward `goal` over the grid's own passability.
pub fn next_step(grid: &Grid, start: Position, goal: Position) -> Option<Position> {
    next_step_with(|x, y| grid.is_passable(x, y), start, goal)
}

/// One A* step toward `goal` under an arbitrary passability rule.
///
/// 8-directional, every step costs 1, heuristic is Euclidean distance; the
/// open queue pops the smallest (score, row, col). An occupied goal retargets
/// to its first passable neighbor in neighbor-mask bit order. Returns the
/// single cell adjacent to `start` on the found path, `Some(start)` when
/// already there, and `None` when no path exists — callers must handle that.
/// The closure decides the search space; off-map coordinates must answer
/// false or the search will not terminate.
pub fn next_step_with<F>(passable: F, start: Position, goal: Position) -> Option<Position>
where
    F: Fn(i32, i32) -> bool,
{
    if start == goal {
        return Some(start);
    }

    let goal = if passable(goal.x, goal.y) {
        goal
    } else {
        let mut fallback = None;
        for (dx, dy) in NEIGHBOR_OFFSETS {
            if passable(goal.x + dx, goal.y + dy) {
                fallback = Some(Position::new(goal.x + dx, goal.y + dy));
                break;
            }
        }
        fallback?
    };
    if start == goal {
        return Some(start);
    }

    let mut queue: BinaryHeap<PathNode> = BinaryHeap::new();
    let mut best_steps: HashMap<Position, i32> = HashMap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();

    best_steps.insert(start, 0);
    queue.push(PathNode {
        position: start,
        steps: 0,
        score: start.distance(&goal),
    });

    while let Some(node) = queue.pop() {
        let pos = node.position;

        if pos == goal {
            // Walk the chain back to the cell adjacent to the start
            let mut cell = pos;
            while let Some(&prev) = came_from.get(&cell) {
                if prev == start {
                    break;
                }
                cell = prev;
            }
            return Some(cell);
        }

        // Stale entry for a cell later reached in fewer steps
        if let Some(&best) = best_steps.get(&pos) {
            if node.steps > best {
                continue;
            }
        }

        for (dx, dy) in NEIGHBOR_OFFSETS {
            let next = Position::new(pos.x + dx, pos.y + dy);
            if !passable(next.x, next.y) {
                continue;
            }
            let steps = node.steps + 1;
            let better = match best_steps.get(&next) {
                Some(&best) => steps < best,
                None => true,
            };
            if better {
                best_steps.insert(next, steps);
                came_from.insert(next, pos);
                queue.push(PathNode {
                    position: next,
                    steps,
                    score: steps as f64 + next.distance(&goal),
                });
            }
        }
    }

    None
}

/// Multi-source flood-fill field of step counts toward a set of targets,
/// plus the steering query evaluated against it.
///
/// The field is rebuilt lazily: `refresh` recomputes only when a tracked
/// target crossed into a new cell or the grid revision moved (cell edits and
/// door threshold crossings). `steer` never refreshes; callers refresh
/// first, then steer any number of agents against the same field.
pub struct ApproachMap {
    pub rows: i32,
    pub cols: i32,
    /// Steps to the nearest target per cell, `UNREACHED` where the fill
    /// never arrived
    pub steps: Vec<i32>,
    /// Crowding radius used by the steering penalty
    pub occupancy_span: i32,
    last_targets: Vec<(i32, i32)>,
    last_revision: u64,
}

impl ApproachMap {
    pub fn new(rows: i32, cols: i32) -> Self {
        ApproachMap {
            rows,
            cols,
            steps: vec![UNREACHED; (rows * cols).max(0) as usize],
            occupancy_span: OCCUPANCY_SPAN,
            last_targets: Vec::new(),
            last_revision: u64::MAX,
        }
    }

    /// Field value at a cell; off-map reads as UNREACHED
    pub fn value(&self, cell: (i32, i32)) -> i32 {
        if cell.0 < 0 || cell.0 >= self.cols || cell.1 < 0 || cell.1 >= self.rows {
            return UNREACHED;
        }
        self.steps[(cell.0 + cell.1 * self.cols) as usize]
    }

    /// Recompute the field when a target changed cell or the grid changed.
    /// Returns whether a rebuild happened.
    pub fn refresh(&mut self, grid: &Grid, targets: &[(f32, f32)]) -> bool {
        let cells = target_cells(targets);
        if cells == self.last_targets && grid.get_revision() == self.last_revision {
            return false;
        }
        self.fill(grid, cells);
        true
    }

    /// Unconditional recompute
    pub fn rebuild(&mut self, grid: &Grid, targets: &[(f32, f32)]) {
        let cells = target_cells(targets);
        self.fill(grid, cells);
    }

    fn fill(&mut self, grid: &Grid, cells: Vec<(i32, i32)>) {
        self.rows = grid.rows;
        self.cols = grid.cols;
        self.steps = vec![UNREACHED; (self.rows * self.cols).max(0) as usize];
        let mut queue = VecDeque::new();
        for &(x, y) in &cells {
            if grid.in_bounds(x, y) {
                let id = (x + y * self.cols) as usize;
                if self.steps[id] == UNREACHED {
                    self.steps[id] = 0;
                    queue.push_back((x, y));
                }
            }
        }
        while let Some((x, y)) = queue.pop_front() {
            let below = self.steps[(x + y * self.cols) as usize] + 1;
            for (dx, dy) in NEIGHBOR_OFFSETS {
                let (nx, ny) = (x + dx, y + dy);
                if !grid.is_passable(nx, ny) {
                    continue;
                }
                let id = (nx + ny * self.cols) as usize;
                if self.steps[id] == UNREACHED {
                    self.steps[id] = below;
                    queue.push_back((nx, ny));
                }
            }
        }
        self.last_targets = cells;
        self.last_revision = grid.get_revision();
    }

    /// Movement direction for an agent descending the field.
    ///
    /// Each passable neighbor's field value is weighted down by a crowd
    /// penalty: other agents near it, found through the spatial index, add
    /// `occupancy_span - manhattan` each, and the querying agent's own
    /// footprint is skipped so it never flees itself. Ties go to the
    /// neighbor whose direction best matches the agent's sub-cell offset.
    /// When the agent's own cell is at least as good as every neighbor the
    /// result is the zero vector (standing on a target does not jitter).
    ///
    /// Up to `LOOKAHEAD_CELLS` further chain cells blend in with decaying
    /// weights for corner-smoothing, aborted once a chain cell loses line of
    /// sight to the true target. The sum is normalized.
    pub fn steer(
        &self,
        grid: &Grid,
        index: &ActorIndex,
        self_id: usize,
        pos: (f32, f32),
        target: (f32, f32),
    ) -> (f32, f32) {
        let cell = (pos.0.floor() as i32, pos.1.floor() as i32);
        if !grid.in_bounds(cell.0, cell.1) {
            return (0.0, 0.0);
        }
        let target_cell = (target.0.floor() as i32, target.1.floor() as i32);

        let here = match self.value(cell) {
            UNREACHED => UNREACHED,
            v => v + self.crowd_penalty(index, self_id, cell),
        };

        let fx = pos.0 - (cell.0 as f32 + 0.5);
        let fy = pos.1 - (cell.1 as f32 + 0.5);

        let mut best: Option<((i32, i32), i32, f32)> = None;
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let next = (cell.0 + dx, cell.1 + dy);
            if !grid.is_passable(next.0, next.1) {
                continue;
            }
            let value = self.value(next);
            if value == UNREACHED {
                continue;
            }
            let discounted = value + self.crowd_penalty(index, self_id, next);
            let bias =
                (dx as f32 - fx) * (dx as f32 - fx) + (dy as f32 - fy) * (dy as f32 - fy);
            let better = match best {
                None => true,
                Some((_, bv, bb)) => discounted < bv || (discounted == bv && bias < bb),
            };
            if better {
                best = Some((next, discounted, bias));
            }
        }

        let (first, best_value, _) = match best {
            Some(b) => b,
            None => return (0.0, 0.0),
        };
        if here <= best_value {
            return (0.0, 0.0);
        }

        let mut sum_x = (first.0 - cell.0) as f32;
        let mut sum_y = (first.1 - cell.1) as f32;
        let mut chain = first;
        for i in 1..LOOKAHEAD_CELLS {
            let next = match self.descend(grid, chain) {
                Some(next) => next,
                None => break,
            };
            if !line_of_sight(grid, next, target_cell) {
                break;
            }
            let weight = 1.0 / (i as f32 * LOOKAHEAD_FALLOFF + 1.0);
            sum_x += (next.0 - chain.0) as f32 * weight;
            sum_y += (next.1 - chain.1) as f32 * weight;
            chain = next;
        }

        let mag = (sum_x * sum_x + sum_y * sum_y).sqrt();
        if mag < 1e-6 {
            return (0.0, 0.0);
        }
        (sum_x / mag, sum_y / mag)
    }

    /// Raw-field descent step for the lookahead chain: the lowest-valued
    /// passable neighbor, first in mask order on ties, or None once the
    /// chain can descend no further.
    fn descend(&self, grid: &Grid, cell: (i32, i32)) -> Option<(i32, i32)> {
        let here = self.value(cell);
        let mut best: Option<((i32, i32), i32)> = None;
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let next = (cell.0 + dx, cell.1 + dy);
            if !grid.is_passable(next.0, next.1) {
                continue;
            }
            let value = self.value(next);
            if value == UNREACHED {
                continue;
            }
            if best.map_or(true, |(_, bv)| value < bv) {
                best = Some((next, value));
            }
        }
        match best {
            Some((next, value)) if value < here => Some(next),
            _ => None,
        }
    }

    /// Crowding cost other agents add to a candidate cell: each agent within
    /// manhattan `occupancy_span - 1` contributes `span - distance`. The
    /// querying agent itself is skipped wherever its bucket turns up.
    fn crowd_penalty(&self, index: &ActorIndex, self_id: usize, cell: (i32, i32)) -> i32 {
        let span = self.occupancy_span;
        let mut penalty = 0;
        for dy in -(span - 1)..=(span - 1) {
            let reach = span - 1 - dy.abs();
            for dx in -reach..=reach {
                let occupants = index.query(cell.0 + dx, cell.1 + dy);
                let mut count = occupants.len() as i32;
                if occupants.contains(&self_id) {
                    count -= 1;
                }
                penalty += count * (span - dx.abs() - dy.abs());
            }
        }
        penalty
    }
}

fn target_cells(targets: &[(f32, f32)]) -> Vec<(i32, i32)> {
    targets
        .iter()
        .map(|&(x, y)| (x.floor() as i32, y.floor() as i32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::door::{Door, DoorAxis};

    #[test]
    fn test_next_step_closes_distance_monotonically() {
        let grid = Grid::new(5, 5);
        let goal = Position::new(4, 4);
        let mut pos = Position::new(0, 0);
        let mut guard = 0;
        while pos != goal {
            let step = next_step(&grid, pos, goal).expect("empty grid always has a path");
            assert!(
                step.distance(&goal) <= pos.distance(&goal),
                "step {:?} moved away from {:?}",
                step,
                goal
            );
            pos = step;
            guard += 1;
            assert!(guard <= 25, "walk did not terminate");
        }
        // Empty grid: the diagonal is 4 steps
        assert_eq!(guard, 4);
    }

    #[test]
    fn test_next_step_start_is_goal() {
        let grid = Grid::new(3, 3);
        let start = Position::new(1, 1);
        assert_eq!(next_step(&grid, start, start), Some(start));
    }

    #[test]
    fn test_next_step_no_path_is_none() {
        let mut grid = Grid::new(5, 5);
        // Wall off the right side completely
        for y in 0..5 {
            grid.set_cell(3, y, 1);
        }
        let result = next_step(&grid, Position::new(0, 2), Position::new(4, 2));
        assert_eq!(result, None);
    }

    #[test]
    fn test_next_step_goal_retarget_order() {
        let mut grid = Grid::new(5, 5);
        grid.set_cell(2, 2, 1); // goal cell occupied
        // North neighbor blocked too: retarget falls through to South
        grid.set_cell(2, 1, 1);
        let step = next_step(&grid, Position::new(2, 4), Position::new(2, 2));
        assert_eq!(step, Some(Position::new(2, 3)));

        // With South also blocked the next in bit order is West
        grid.set_cell(2, 3, 1);
        let step = next_step(&grid, Position::new(0, 2), Position::new(2, 2));
        assert_eq!(step, Some(Position::new(1, 2)));
    }

    #[test]
    fn test_next_step_around_wall() {
        let mut grid = Grid::new(5, 5);
        for y in 0..4 {
            grid.set_cell(2, y, 1); // wall with a gap at the bottom
        }
        let mut pos = Position::new(0, 0);
        let goal = Position::new(4, 0);
        for _ in 0..20 {
            if pos == goal {
                break;
            }
            pos = next_step(&grid, pos, goal).expect("gap exists");
            assert!(grid.is_passable(pos.x, pos.y));
        }
        assert_eq!(pos, goal);
    }

    #[test]
    fn test_next_step_with_custom_passability() {
        // Confine the search to row 0 of a conceptual 5-wide strip
        let step = next_step_with(
            |x, y| (0..5).contains(&x) && y == 0,
            Position::new(0, 0),
            Position::new(4, 0),
        );
        assert_eq!(step, Some(Position::new(1, 0)));
    }

    #[test]
    fn test_approach_map_field_values() {
        let grid = Grid::new(5, 5);
        let mut map = ApproachMap::new(5, 5);
        map.rebuild(&grid, &[(0.5, 0.5)]);
        assert_eq!(map.value((0, 0)), 0);
        assert_eq!(map.value((1, 1)), 1);
        // 8-directional fill: steps equal the Chebyshev distance when open
        assert_eq!(map.value((4, 4)), 4);
        assert_eq!(map.value((4, 0)), 4);
        assert_eq!(map.value((-1, 0)), UNREACHED);
    }

    #[test]
    fn test_approach_map_multi_source() {
        let grid = Grid::new(5, 5);
        let mut map = ApproachMap::new(5, 5);
        map.rebuild(&grid, &[(0.5, 0.5), (4.5, 4.5)]);
        assert_eq!(map.value((0, 0)), 0);
        assert_eq!(map.value((4, 4)), 0);
        // Middle cell is 2 from both sources
        assert_eq!(map.value((2, 2)), 2);
    }

    #[test]
    fn test_approach_map_unreached_behind_walls() {
        let mut grid = Grid::new(5, 5);
        for y in 0..5 {
            grid.set_cell(2, y, 1);
        }
        let mut map = ApproachMap::new(5, 5);
        map.rebuild(&grid, &[(0.5, 2.5)]);
        assert_eq!(map.value((2, 2)), UNREACHED, "wall cells are not filled");
        assert_eq!(map.value((4, 2)), UNREACHED, "sealed area is unreached");
        assert!(map.value((1, 0)) < UNREACHED);
    }

    #[test]
    fn test_refresh_dirty_contract() {
        let mut grid = Grid::new(5, 5);
        grid.add_door(Door::new(4, 4, DoorAxis::Vertical));
        let mut map = ApproachMap::new(5, 5);

        assert!(map.refresh(&grid, &[(1.5, 1.5)]), "first fill");
        assert!(!map.refresh(&grid, &[(1.5, 1.5)]), "nothing changed");
        // Sub-cell movement does not cross a cell boundary
        assert!(!map.refresh(&grid, &[(1.9, 1.2)]));
        // Crossing into a new cell does
        assert!(map.refresh(&grid, &[(2.5, 1.5)]));
        assert!(!map.refresh(&grid, &[(2.5, 1.5)]));
        // A door crossing bumps the grid revision and dirties the field
        grid.toggle_door((4.5, 4.5));
        grid.update(10.0);
        assert!(map.refresh(&grid, &[(2.5, 1.5)]));
    }

    #[test]
    fn test_steer_at_target_is_zero() {
        let grid = Grid::new(5, 5);
        let mut index = ActorIndex::new(5, 5);
        index.build(&[(2.5, 2.5)]);
        let mut map = ApproachMap::new(5, 5);
        map.rebuild(&grid, &[(2.5, 2.5)]);
        let dir = map.steer(&grid, &index, 0, (2.5, 2.5), (2.5, 2.5));
        assert_eq!(dir, (0.0, 0.0));
    }

    #[test]
    fn test_steer_runs_straight_when_clear() {
        let grid = Grid::new(5, 5);
        let mut index = ActorIndex::new(5, 5);
        index.build(&[(1.5, 2.5)]);
        let mut map = ApproachMap::new(5, 5);
        map.rebuild(&grid, &[(4.5, 2.5)]);
        let (dx, dy) = map.steer(&grid, &index, 0, (1.5, 2.5), (4.5, 2.5));
        assert!(dx > 0.99, "straight run east, got ({}, {})", dx, dy);
        assert!(dy.abs() < 1e-5);
    }

    #[test]
    fn test_steer_swerves_around_crowd() {
        let grid = Grid::new(5, 5);
        let mut index = ActorIndex::new(5, 5);
        // Agent 1 parked directly on the straight-line route
        index.build(&[(1.5, 2.5), (2.5, 2.5)]);
        let mut map = ApproachMap::new(5, 5);
        map.rebuild(&grid, &[(4.5, 2.5)]);
        let (dx, dy) = map.steer(&grid, &index, 0, (1.5, 2.5), (4.5, 2.5));
        assert!(dx > 0.0, "still makes forward progress");
        assert!(
            dy.abs() > 0.1,
            "detours off the blocked row, got ({}, {})",
            dx,
            dy
        );
    }

    #[test]
    fn test_steer_straightens_after_blocker_removed() {
        let grid = Grid::new(5, 5);
        let mut index = ActorIndex::new(5, 5);
        index.build(&[(1.5, 2.5), (2.5, 2.5)]);
        let mut map = ApproachMap::new(5, 5);
        map.rebuild(&grid, &[(4.5, 2.5)]);
        let (_, dy) = map.steer(&grid, &index, 0, (1.5, 2.5), (4.5, 2.5));
        assert!(dy.abs() > 0.1, "parked body repels");

        // Dropping the blocker from the index (death, despawn) clears the route
        index.remove_actor(1, (2.5, 2.5));
        let (dx, dy) = map.steer(&grid, &index, 0, (1.5, 2.5), (4.5, 2.5));
        assert!(dx > 0.99 && dy.abs() < 1e-5, "got ({}, {})", dx, dy);
    }

    #[test]
    fn test_steer_ignores_own_footprint() {
        let grid = Grid::new(5, 5);
        let mut index = ActorIndex::new(5, 5);
        index.build(&[(1.5, 2.5)]);
        let mut map = ApproachMap::new(5, 5);
        map.rebuild(&grid, &[(4.5, 2.5)]);
        // Identical to the straight-run case: the agent's own bucket entry
        // must not count as a crowd
        let (dx, dy) = map.steer(&grid, &index, 0, (1.5, 2.5), (4.5, 2.5));
        assert!(dx > 0.99 && dy.abs() < 1e-5);
    }

    #[test]
    fn test_steer_escapes_unreached_cell() {
        let mut grid = Grid::new(5, 5);
        grid.add_door(Door::new(1, 2, DoorAxis::Vertical));
        let mut map = ApproachMap::new(5, 5);
        map.rebuild(&grid, &[(4.5, 2.5)]);
        let mut index = ActorIndex::new(5, 5);
        index.build(&[(1.5, 2.5)]);
        // Standing inside the closed door cell: the cell has no field value,
        // but the neighbors do, so steering still points somewhere
        let dir = map.steer(&grid, &index, 0, (1.5, 2.5), (4.5, 2.5));
        assert!(dir != (0.0, 0.0));
    }
}
