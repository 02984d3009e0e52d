//! stellar-nav: occupancy-grid mapping, simulated range sensing and grid
//! path planning for a small mobile robot.
//!
//! The crate is layered bottom-up:
//!
//! - [`core`] — pose, motion model and angular math
//! - [`world`] — ground-truth occupancy grid loaded from a map image
//! - [`sensing`] — Bresenham ray casting and the simulated sensor array
//! - [`mapping`] — log-odds belief grid, fusion and binary persistence
//! - [`planning`] — A* over the belief grid plus line-of-sight smoothing
//! - [`control`] — reactive wall-following steering
//! - [`sim`] — the sense-fuse-steer-move loop and offline route building
//! - [`telemetry`] — best-effort JSON status reporting
//!
//! Lower layers never depend on higher ones; the belief grid never reads
//! the ground truth except through a sensor reading.

pub mod config;
pub mod control;
pub mod core;
pub mod error;
pub mod mapping;
pub mod planning;
pub mod sensing;
pub mod sim;
pub mod telemetry;
pub mod world;

pub use config::Config;
pub use core::{GridPose, Pose};
pub use error::{Result, StellarError};
pub use mapping::{BeliefGrid, CellState, FusionConfig};
pub use planning::{AStarPlanner, PlanError, PlannerConfig};
pub use sensing::{RangeReading, SensorArray, NO_DETECTION};
pub use sim::{DisplaySurface, HeadlessDisplay, Session};
pub use world::WorldGrid;
