//! Simulated range sensing over the ground-truth grid.
//!
//! A ray-cast sensor walks the discrete line from the robot's grid cell
//! along a bearing and reports the distance (in cells) to the first
//! occupied cell. A miss is the [`NO_DETECTION`] sentinel, not an error;
//! callers must check [`RangeReading::is_hit`] before treating the value
//! as a range.

pub mod noise;
pub mod ray;

pub use noise::NoiseModel;
pub use ray::RayIter;

use std::f32::consts::FRAC_PI_2;

use crate::core::GridPose;
use crate::world::WorldGrid;

/// Sentinel distance for "no obstacle within range".
pub const NO_DETECTION: f32 = -1.0;

/// One range measurement from one sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeReading {
    /// Bearing offset relative to the robot heading, radians.
    pub bearing: f32,
    /// Distance to the first occupied cell, in cells, or [`NO_DETECTION`].
    pub distance: f32,
}

impl RangeReading {
    /// Whether this reading detected an obstacle.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.distance >= 0.0
    }
}

/// Cast a ray from `origin` at absolute angle `theta + bearing` and return
/// the distance in cells to the first cell whose occupancy exceeds
/// `threshold`, or [`NO_DETECTION`].
///
/// The beam endpoint at range `z_max` is floored to a cell and the discrete
/// line is walked with Bresenham so no intermediate cell is skipped. A ray
/// leaving the grid makes no further progress in that direction.
pub fn sense_distance(
    world: &WorldGrid,
    origin: GridPose,
    theta: f32,
    bearing: f32,
    threshold: f32,
    z_max: f32,
) -> f32 {
    let angle = theta + bearing;
    let end_col = (origin.col as f32 + z_max * angle.cos()).floor() as i32;
    let end_row = (origin.row as f32 + z_max * angle.sin()).floor() as i32;

    for (col, row) in RayIter::new(origin.col, origin.row, end_col, end_row) {
        if !world.contains(row, col) {
            break;
        }
        if world.occupancy(row, col) > threshold {
            return origin.distance(&GridPose::new(col, row));
        }
    }

    NO_DETECTION
}

/// Configuration for a fixed set of range sensors.
#[derive(Debug, Clone)]
pub struct SensorArrayConfig {
    /// Bearing offsets relative to the robot heading, radians.
    ///
    /// Readings come back in this order; callers index them positionally
    /// (front, left, right by default).
    pub bearings: Vec<f32>,

    /// Maximum range in cells.
    pub z_max: f32,

    /// Occupancy probability above which a world cell stops the ray.
    pub occupancy_threshold: f32,

    /// Beam opening angle in radians, consumed by map fusion (the ray cast
    /// itself is a single line).
    pub opening_angle: f32,
}

impl Default for SensorArrayConfig {
    fn default() -> Self {
        Self {
            bearings: vec![0.0, FRAC_PI_2, -FRAC_PI_2],
            z_max: 40.0,
            occupancy_threshold: 0.5,
            opening_angle: 15.0_f32.to_radians(),
        }
    }
}

/// A fixed array of ray-cast sensors mounted at known bearings.
#[derive(Debug, Clone)]
pub struct SensorArray {
    config: SensorArrayConfig,
    noise: Option<NoiseModel>,
}

impl SensorArray {
    pub fn new(config: SensorArrayConfig) -> Self {
        Self {
            config,
            noise: None,
        }
    }

    /// Attach Gaussian range noise to every hit reading.
    pub fn with_noise(mut self, noise: NoiseModel) -> Self {
        self.noise = Some(noise);
        self
    }

    pub fn config(&self) -> &SensorArrayConfig {
        &self.config
    }

    /// Take one reading per configured sensor, in configured order.
    ///
    /// Noise, when enabled, perturbs hit distances only; a miss stays a
    /// miss and a hit never leaves `[0, z_max]`.
    pub fn sense(&mut self, world: &WorldGrid, origin: GridPose, theta: f32) -> Vec<RangeReading> {
        let cfg = &self.config;
        let mut readings = Vec::with_capacity(cfg.bearings.len());

        for &bearing in &cfg.bearings {
            let mut distance = sense_distance(
                world,
                origin,
                theta,
                bearing,
                cfg.occupancy_threshold,
                cfg.z_max,
            );

            if distance >= 0.0 {
                if let Some(noise) = &mut self.noise {
                    distance = (distance + noise.range_jitter()).clamp(0.0, cfg.z_max);
                }
            }

            readings.push(RangeReading { bearing, distance });
        }

        readings
    }
}
