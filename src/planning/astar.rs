//! A* grid planner over the belief grid.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use thiserror::Error;
use tracing::debug;

use crate::core::GridPose;
use crate::mapping::BeliefGrid;

/// Planner failure modes, distinguished so callers can react per leg.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("start cell ({0}, {1}) is outside the grid")]
    StartOutOfBounds(i32, i32),

    #[error("goal cell ({0}, {1}) is outside the grid")]
    GoalOutOfBounds(i32, i32),

    #[error("start cell ({0}, {1}) is occupied")]
    StartOccupied(i32, i32),

    #[error("goal cell ({0}, {1}) is occupied")]
    GoalOccupied(i32, i32),

    #[error("no path between ({}, {}) and ({}, {})", start.col, start.row, goal.col, goal.row)]
    NoPath { start: GridPose, goal: GridPose },

    #[error("search exceeded {0} iterations")]
    MaxIterationsExceeded(usize),
}

/// A* tunables.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Log-odds at or above which a belief cell is an obstacle.
    pub occupied_threshold: f32,

    /// Allow the 4 diagonal moves in addition to the cardinals.
    pub allow_diagonal: bool,

    /// Hard cap on expanded nodes; a hit is an error, not a truncated path.
    pub max_iterations: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            occupied_threshold: 0.5,
            allow_diagonal: true,
            max_iterations: 500_000,
        }
    }
}

const SQRT_2: f32 = std::f32::consts::SQRT_2;

/// Open-set entry ordered by lowest f-score first.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenNode {
    f_score: f32,
    cell: GridPose,
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the smallest f-score
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Grid A* with optional diagonal moves.
#[derive(Debug, Clone)]
pub struct AStarPlanner {
    config: PlannerConfig,
}

impl AStarPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn blocked(&self, belief: &BeliefGrid, row: i32, col: i32) -> bool {
        belief.log_odds(row, col) >= self.config.occupied_threshold
    }

    /// Plan a cell path from `start` to `goal`, endpoints inclusive.
    ///
    /// Moves are the 4 cardinals plus, when enabled, the 4 diagonals. A
    /// diagonal step is legal only if both adjacent cardinal cells are
    /// passable, so paths never cut a corner a robot body could not clear.
    /// Unknown cells are traversable; only cells at or above the occupancy
    /// threshold block.
    pub fn plan(
        &self,
        belief: &BeliefGrid,
        start: GridPose,
        goal: GridPose,
    ) -> Result<Vec<GridPose>, PlanError> {
        if !belief.contains(start.row, start.col) {
            return Err(PlanError::StartOutOfBounds(start.col, start.row));
        }
        if !belief.contains(goal.row, goal.col) {
            return Err(PlanError::GoalOutOfBounds(goal.col, goal.row));
        }
        if self.blocked(belief, start.row, start.col) {
            return Err(PlanError::StartOccupied(start.col, start.row));
        }
        if self.blocked(belief, goal.row, goal.col) {
            return Err(PlanError::GoalOccupied(goal.col, goal.row));
        }
        if start == goal {
            return Ok(vec![start]);
        }

        let mut open = BinaryHeap::new();
        let mut came_from: HashMap<GridPose, GridPose> = HashMap::new();
        let mut g_score: HashMap<GridPose, f32> = HashMap::new();

        g_score.insert(start, 0.0);
        open.push(OpenNode {
            f_score: start.distance(&goal),
            cell: start,
        });

        let mut iterations = 0usize;

        while let Some(OpenNode { cell: current, .. }) = open.pop() {
            iterations += 1;
            if iterations > self.config.max_iterations {
                return Err(PlanError::MaxIterationsExceeded(self.config.max_iterations));
            }

            if current == goal {
                let path = reconstruct(&came_from, current);
                debug!(
                    waypoints = path.len(),
                    iterations, "planner reached the goal"
                );
                return Ok(path);
            }

            let current_g = g_score[&current];

            for (dc, dr, step_cost) in self.neighbors() {
                let next = GridPose::new(current.col + dc, current.row + dr);
                if !belief.contains(next.row, next.col)
                    || self.blocked(belief, next.row, next.col)
                {
                    continue;
                }
                // Diagonal moves must not squeeze between two blocked cells
                if dc != 0
                    && dr != 0
                    && (self.blocked(belief, current.row, current.col + dc)
                        || self.blocked(belief, current.row + dr, current.col))
                {
                    continue;
                }

                let tentative = current_g + step_cost;
                if tentative < *g_score.get(&next).unwrap_or(&f32::INFINITY) {
                    came_from.insert(next, current);
                    g_score.insert(next, tentative);
                    open.push(OpenNode {
                        f_score: tentative + next.distance(&goal),
                        cell: next,
                    });
                }
            }
        }

        Err(PlanError::NoPath { start, goal })
    }

    fn neighbors(&self) -> impl Iterator<Item = (i32, i32, f32)> {
        const CARDINAL: [(i32, i32, f32); 4] =
            [(1, 0, 1.0), (-1, 0, 1.0), (0, 1, 1.0), (0, -1, 1.0)];
        const DIAGONAL: [(i32, i32, f32); 4] = [
            (1, 1, SQRT_2),
            (1, -1, SQRT_2),
            (-1, 1, SQRT_2),
            (-1, -1, SQRT_2),
        ];

        let take_diagonal = if self.config.allow_diagonal { 4 } else { 0 };
        CARDINAL
            .into_iter()
            .chain(DIAGONAL.into_iter().take(take_diagonal))
    }
}

fn reconstruct(came_from: &HashMap<GridPose, GridPose>, mut current: GridPose) -> Vec<GridPose> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        current = prev;
        path.push(current);
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FusionConfig;

    fn planner() -> AStarPlanner {
        AStarPlanner::new(PlannerConfig::default())
    }

    fn open_belief() -> BeliefGrid {
        BeliefGrid::new(30, 30, FusionConfig::default())
    }

    fn block(belief: &mut BeliefGrid, row: i32, col: i32) {
        belief.stamp_segment(GridPose::new(col, row), GridPose::new(col, row));
    }

    fn step_is_adjacent(path: &[GridPose]) -> bool {
        path.windows(2).all(|pair| {
            let dc = (pair[1].col - pair[0].col).abs();
            let dr = (pair[1].row - pair[0].row).abs();
            dc <= 1 && dr <= 1 && (dc, dr) != (0, 0)
        })
    }

    #[test]
    fn test_straight_path_in_open_grid() {
        let belief = open_belief();
        let path = planner()
            .plan(&belief, GridPose::new(2, 2), GridPose::new(12, 2))
            .unwrap();

        assert_eq!(path[0], GridPose::new(2, 2));
        assert_eq!(*path.last().unwrap(), GridPose::new(12, 2));
        assert_eq!(path.len(), 11);
        assert!(step_is_adjacent(&path));
    }

    #[test]
    fn test_path_routes_around_wall() {
        let mut belief = open_belief();
        // Vertical wall at col 10 with a gap at row 20
        belief.stamp_segment(GridPose::new(10, 0), GridPose::new(10, 18));
        let path = planner()
            .plan(&belief, GridPose::new(5, 5), GridPose::new(20, 5))
            .unwrap();

        assert_eq!(path[0], GridPose::new(5, 5));
        assert_eq!(*path.last().unwrap(), GridPose::new(20, 5));
        assert!(step_is_adjacent(&path));
        // Every waypoint is passable
        for p in &path {
            assert!(belief.log_odds(p.row, p.col) < 0.5);
        }
        // The gap forces a detour south of row 18
        assert!(path.iter().any(|p| p.row > 18));
    }

    #[test]
    fn test_no_path_through_sealed_wall() {
        let mut belief = open_belief();
        // stamp_segment thickens by one cell, so rows 10-11 are sealed
        belief.stamp_segment(GridPose::new(0, 10), GridPose::new(29, 10));
        let err = planner()
            .plan(&belief, GridPose::new(5, 5), GridPose::new(5, 25))
            .unwrap_err();
        assert!(matches!(err, PlanError::NoPath { .. }));
    }

    #[test]
    fn test_occupied_endpoints_rejected() {
        let mut belief = open_belief();
        block(&mut belief, 5, 5);
        block(&mut belief, 20, 20);

        let p = planner();
        assert!(matches!(
            p.plan(&belief, GridPose::new(5, 5), GridPose::new(2, 2)),
            Err(PlanError::StartOccupied(5, 5))
        ));
        assert!(matches!(
            p.plan(&belief, GridPose::new(2, 2), GridPose::new(20, 20)),
            Err(PlanError::GoalOccupied(20, 20))
        ));
    }

    #[test]
    fn test_out_of_bounds_endpoints_rejected() {
        let belief = open_belief();
        let p = planner();
        assert!(matches!(
            p.plan(&belief, GridPose::new(-1, 5), GridPose::new(2, 2)),
            Err(PlanError::StartOutOfBounds(-1, 5))
        ));
        assert!(matches!(
            p.plan(&belief, GridPose::new(2, 2), GridPose::new(99, 2)),
            Err(PlanError::GoalOutOfBounds(99, 2))
        ));
    }

    #[test]
    fn test_start_equals_goal() {
        let belief = open_belief();
        let path = planner()
            .plan(&belief, GridPose::new(7, 7), GridPose::new(7, 7))
            .unwrap();
        assert_eq!(path, vec![GridPose::new(7, 7)]);
    }

    #[test]
    fn test_diagonal_does_not_cut_corners() {
        let mut belief = open_belief();
        // Two blocked cells sharing only the corner between (5,5) and (6,6)
        block(&mut belief, 5, 6);
        block(&mut belief, 6, 5);

        let path = planner()
            .plan(&belief, GridPose::new(5, 5), GridPose::new(8, 8))
            .unwrap();
        // The direct diagonal through the pinch is forbidden
        for pair in path.windows(2) {
            let squeeze = pair[0] == GridPose::new(5, 5) && pair[1] == GridPose::new(6, 6);
            assert!(!squeeze, "path cut the corner at the pinch point");
        }
    }

    #[test]
    fn test_cardinal_only_mode() {
        let belief = open_belief();
        let p = AStarPlanner::new(PlannerConfig {
            allow_diagonal: false,
            ..Default::default()
        });
        let path = p
            .plan(&belief, GridPose::new(0, 0), GridPose::new(5, 5))
            .unwrap();
        for pair in path.windows(2) {
            let dc = (pair[1].col - pair[0].col).abs();
            let dr = (pair[1].row - pair[0].row).abs();
            assert_eq!(dc + dr, 1, "cardinal-only path took a diagonal");
        }
    }

    #[test]
    fn test_iteration_cap_is_an_error() {
        let belief = open_belief();
        let p = AStarPlanner::new(PlannerConfig {
            max_iterations: 3,
            ..Default::default()
        });
        let err = p
            .plan(&belief, GridPose::new(0, 0), GridPose::new(29, 29))
            .unwrap_err();
        assert_eq!(err, PlanError::MaxIterationsExceeded(3));
    }
}
