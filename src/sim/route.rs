//! Offline route construction over a saved belief grid.
//!
//! Landmarks get stamped into the belief as hard boundaries, then the
//! route visits waypoints in order: one A* leg per consecutive pair, legs
//! concatenated and smoothed once at the end. A failed leg is skipped
//! with a warning so one unreachable waypoint does not sink the route.

use tracing::{info, warn};

use crate::core::GridPose;
use crate::mapping::BeliefGrid;
use crate::planning::{smoothen, AStarPlanner};

use super::DisplaySurface;

/// Stamp consecutive landmark pairs as obstacle segments.
///
/// `(0, 2), (1, 3)` connects landmark 0 to 2 and 1 to 3; indexes out of
/// range are skipped with a warning.
pub fn connect_landmarks(belief: &mut BeliefGrid, landmarks: &[GridPose], pairs: &[(usize, usize)]) {
    for &(a, b) in pairs {
        match (landmarks.get(a), landmarks.get(b)) {
            (Some(&from), Some(&to)) => belief.stamp_segment(from, to),
            _ => warn!(a, b, count = landmarks.len(), "landmark pair out of range, skipped"),
        }
    }
}

/// Plan a route through `waypoints` in order and smooth the result.
///
/// Each waypoint is marked on the display before planning, so a viewer
/// shows the goals even for legs that fail. Returns the smoothed cell
/// path, or `None` when no leg could be planned at all.
pub fn plan_route<D: DisplaySurface>(
    planner: &AStarPlanner,
    belief: &BeliefGrid,
    waypoints: &[GridPose],
    display: &mut D,
) -> Option<Vec<GridPose>> {
    if waypoints.len() < 2 {
        return None;
    }

    for &waypoint in waypoints {
        display.show_marker(waypoint);
    }

    let mut route: Vec<GridPose> = Vec::new();

    for pair in waypoints.windows(2) {
        let (start, goal) = (pair[0], pair[1]);
        match planner.plan(belief, start, goal) {
            Ok(leg) => {
                // Drop the joint cell shared with the previous leg
                let skip = usize::from(!route.is_empty());
                route.extend(leg.into_iter().skip(skip));
            }
            Err(e) => {
                warn!(
                    start = ?(start.col, start.row),
                    goal = ?(goal.col, goal.row),
                    error = %e,
                    "leg skipped"
                );
            }
        }
    }

    if route.is_empty() {
        return None;
    }

    let smoothed = smoothen(belief, &route, planner.config().occupied_threshold);
    info!(
        waypoints = waypoints.len(),
        cells = route.len(),
        smoothed = smoothed.len(),
        "route planned"
    );
    Some(smoothed)
}
