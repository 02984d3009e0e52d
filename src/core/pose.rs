//! Robot pose and motion model.
//!
//! Poses are immutable snapshots: every motion step produces a new value,
//! so a caller can keep the full history if it wants to. Headings are
//! radians only; callers working in degrees convert before calling in.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

/// Robot pose: position in world units and heading in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// X position (world units, meters in the live loop)
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Heading in radians
    pub theta: f32,
}

/// A pose projected into grid coordinates.
///
/// `col` indexes x, `row` indexes y; grid storage is addressed `(row, col)`.
/// This is the single conversion point between pose math in `(x, y)` and
/// grid storage in `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPose {
    pub col: i32,
    pub row: i32,
}

impl Pose {
    /// Default steering clamp: a quarter turn per step.
    pub const MAX_STEERING: f32 = FRAC_PI_2;

    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self { x, y, theta }
    }

    /// Pose at the origin, facing along +X.
    #[inline]
    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Advance the pose by `distance` after steering by `steering` radians.
    ///
    /// Steering is clamped to `[-max_steering, max_steering]` and distance
    /// to `>= 0` (the robot never moves backward). Out-of-range inputs are
    /// clamped silently, not rejected.
    #[must_use]
    pub fn advance(&self, distance: f32, steering: f32, max_steering: f32) -> Pose {
        let steering = steering.clamp(-max_steering, max_steering);
        let distance = distance.max(0.0);

        let theta = self.theta + steering;
        Pose {
            x: self.x + distance * theta.cos(),
            y: self.y + distance * theta.sin(),
            theta,
        }
    }

    /// Project the pose into grid coordinates at `scale` world units per cell.
    ///
    /// Coordinates are truncated, not rounded; which cell a beam originates
    /// from depends on this.
    #[inline]
    pub fn grid_cell(&self, scale: f32) -> (GridPose, f32) {
        let cell = GridPose {
            col: (self.x / scale) as i32,
            row: (self.y / scale) as i32,
        };
        (cell, self.theta)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::origin()
    }
}

impl GridPose {
    #[inline]
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Euclidean distance to another cell, in cells.
    #[inline]
    pub fn distance(&self, other: &GridPose) -> f32 {
        let dx = (other.col - self.col) as f32;
        let dy = (other.row - self.row) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}
