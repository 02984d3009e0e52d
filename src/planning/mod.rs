//! Path planning over the belief grid.

pub mod astar;
pub mod smoother;

pub use astar::{AStarPlanner, PlanError, PlannerConfig};
pub use smoother::{line_of_sight, smoothen};
