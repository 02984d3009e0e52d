//! Line-of-sight path smoothing.
//!
//! Grid A* paths stair-step; the smoother collapses runs of waypoints
//! whenever the straight segment between them crosses no occupied cell,
//! leaving only the turns that matter.

use tracing::debug;

use crate::core::GridPose;
use crate::mapping::BeliefGrid;
use crate::sensing::RayIter;

/// Whether the straight rasterized segment from `a` to `b` stays clear of
/// cells at or above `occupied_threshold`. Out-of-grid cells block.
pub fn line_of_sight(
    belief: &BeliefGrid,
    a: GridPose,
    b: GridPose,
    occupied_threshold: f32,
) -> bool {
    for (col, row) in RayIter::new(a.col, a.row, b.col, b.row) {
        if !belief.contains(row, col) || belief.log_odds(row, col) >= occupied_threshold {
            return false;
        }
    }
    true
}

/// Greedily drop waypoints that a straight clear segment can replace.
///
/// From each kept waypoint, the farthest later waypoint still in line of
/// sight becomes the next kept one. First and last waypoints always
/// survive, and re-smoothing an already smooth path changes nothing.
pub fn smoothen(
    belief: &BeliefGrid,
    path: &[GridPose],
    occupied_threshold: f32,
) -> Vec<GridPose> {
    if path.len() <= 2 {
        return path.to_vec();
    }

    let mut smoothed = vec![path[0]];
    let mut anchor = 0;

    while anchor < path.len() - 1 {
        let mut best = anchor + 1;
        for candidate in (anchor + 1..path.len()).rev() {
            if line_of_sight(belief, path[anchor], path[candidate], occupied_threshold) {
                best = candidate;
                break;
            }
        }
        smoothed.push(path[best]);
        anchor = best;
    }

    debug!(before = path.len(), after = smoothed.len(), "smoothed path");
    smoothed
}
