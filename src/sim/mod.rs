//! The live simulation loop.
//!
//! One tick is move, sense, fuse, steer: the motion model advances the
//! pose with the previous command, the sensor array reads the
//! ground-truth world from the new pose, every reading (hit or miss) is
//! fused into the belief grid, and the wall follower picks the next
//! steering command. Rendering and telemetry hang off the loop but never
//! steer it.

pub mod route;

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::config::Config;
use crate::control::follow_wall;
use crate::core::{GridPose, Pose};
use crate::mapping::BeliefGrid;
use crate::sensing::{NoiseModel, RangeReading, SensorArray};
use crate::telemetry::{StatusReport, StatusSender, StatusWorker};
use crate::world::WorldGrid;

/// Where each tick's pose and belief go.
///
/// `vmin` / `vmax` give the log-odds range for rendering. Returning
/// `false` from [`DisplaySurface::display`] asks the loop to stop, the
/// same way closing a viewer window would.
pub trait DisplaySurface {
    fn display(&mut self, pose: &Pose, belief: &BeliefGrid, vmin: f32, vmax: f32) -> bool;

    /// Mark a cell of interest (landmark, goal). Default: ignore.
    fn show_marker(&mut self, _cell: GridPose) {}
}

/// Display that renders nothing and never requests a stop.
#[derive(Debug, Default)]
pub struct HeadlessDisplay;

impl DisplaySurface for HeadlessDisplay {
    fn display(&mut self, _pose: &Pose, _belief: &BeliefGrid, _vmin: f32, _vmax: f32) -> bool {
        true
    }
}

/// One wall-following run over a ground-truth world.
pub struct Session {
    world: WorldGrid,
    belief: BeliefGrid,
    sensors: SensorArray,
    pose: Pose,
    speed: f32,
    scale: f32,
    max_steering: f32,
    tick_seconds: f32,
    step: u64,
    last_steering_deg: f32,
    last_readings: Vec<RangeReading>,
    reporter: Option<StatusWorker>,
    report_interval: u64,
}

impl Session {
    /// Assemble a session from a loaded world and a configuration.
    ///
    /// The robot starts at the grid center, facing +X.
    pub fn new(world: WorldGrid, config: &Config) -> Self {
        let belief = BeliefGrid::new(
            world.width(),
            world.height(),
            config.mapping.to_fusion_config(),
        );

        let mut sensors = SensorArray::new(
            config
                .sensors
                .to_array_config(config.world.occupancy_threshold),
        );
        if config.sensors.noise_stddev > 0.0 {
            sensors = sensors.with_noise(NoiseModel::new(
                config.sensors.noise_stddev,
                config.sensors.noise_seed,
            ));
        }

        let scale = config.world.scale;
        let pose = Pose::new(
            world.width() as f32 / 2.0 * scale,
            world.height() as f32 / 2.0 * scale,
            0.0,
        );

        let reporter = if config.telemetry.enabled {
            match config.telemetry.addr.parse() {
                Ok(addr) => Some(StatusWorker::spawn(StatusSender::new(addr))),
                Err(e) => {
                    warn!(addr = %config.telemetry.addr, error = %e, "bad telemetry address, reporting disabled");
                    None
                }
            }
        } else {
            None
        };

        Self {
            world,
            belief,
            sensors,
            pose,
            speed: config.control.speed,
            scale,
            max_steering: config.control.max_steering_deg.to_radians(),
            tick_seconds: config.control.tick_seconds,
            step: 0,
            last_steering_deg: 0.0,
            last_readings: Vec::new(),
            reporter,
            report_interval: config.telemetry.report_interval.max(1),
        }
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn belief(&self) -> &BeliefGrid {
        &self.belief
    }

    pub fn belief_mut(&mut self) -> &mut BeliefGrid {
        &mut self.belief
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Run one move-sense-fuse-steer cycle over `dt` seconds.
    ///
    /// The pose advances with the steering decided on the previous tick,
    /// then fresh readings update the belief and pick the next command.
    pub fn tick(&mut self, dt: f32) {
        self.pose = self.pose.advance(
            self.speed * dt,
            self.last_steering_deg.to_radians(),
            self.max_steering,
        );

        let (cell, theta) = self.pose.grid_cell(self.scale);
        let readings = self.sensors.sense(&self.world, cell, theta);

        let cfg = self.sensors.config();
        let opening = cfg.opening_angle;
        let z_max = cfg.z_max;
        for reading in &readings {
            self.belief
                .fuse(cell, theta, reading.distance, reading.bearing, opening, z_max);
        }

        // Range readings are in cells; the steering table works in world
        // units, so scale them before deciding. A missing sensor reads as
        // a miss.
        let distance_at = |i: usize| {
            readings
                .get(i)
                .map_or(crate::sensing::NO_DETECTION, |r| r.distance)
        };
        let front = to_world_units(distance_at(0), self.scale);
        let left = to_world_units(distance_at(1), self.scale);
        let right = to_world_units(distance_at(2), self.scale);

        self.last_steering_deg = follow_wall(front, left, right);
        self.last_readings = readings;
        self.step += 1;
    }

    fn report(&self) -> StatusReport {
        let (cells_free, cells_unknown, cells_occupied) = self.belief.count_cells();
        StatusReport {
            step: self.step,
            pose: self.pose,
            steering_deg: self.last_steering_deg,
            ranges: self.last_readings.iter().map(|r| r.distance).collect(),
            battery: None,
            cells_free,
            cells_unknown,
            cells_occupied,
        }
    }

    /// Run until `running` clears, the display asks to stop, or `max_steps`
    /// elapse (0 = unbounded). Returns the number of steps run.
    pub fn run<D: DisplaySurface>(
        &mut self,
        display: &mut D,
        running: &AtomicBool,
        max_steps: u64,
    ) -> u64 {
        let started_at = self.step;

        while running.load(Ordering::Relaxed) {
            if max_steps > 0 && self.step - started_at >= max_steps {
                break;
            }

            self.tick(self.tick_seconds);

            if self.step % self.report_interval == 0 {
                if let Some(reporter) = &self.reporter {
                    // Best-effort: the worker owns the socket, a busy or
                    // dead listener costs the tick nothing
                    reporter.report(self.report());
                }
            }

            let cfg = self.belief.config();
            let (vmin, vmax) = (cfg.log_odd_min, cfg.log_odd_max);
            if !display.display(&self.pose, &self.belief, vmin, vmax) {
                info!("display requested stop");
                break;
            }
        }

        self.step - started_at
    }
}

fn to_world_units(distance_cells: f32, scale: f32) -> f32 {
    if distance_cells < 0.0 {
        distance_cells
    } else {
        distance_cells * scale
    }
}
