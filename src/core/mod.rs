//! Foundation types: pose, grid coordinates, angular math.

pub mod math;
pub mod pose;

pub use pose::{GridPose, Pose};
