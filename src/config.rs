//! TOML configuration for the simulation tools.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! runnable configuration and a file only needs to name the fields it
//! overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::mapping::FusionConfig;
use crate::planning::PlannerConfig;
use crate::sensing::SensorArrayConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub world: WorldConfig,
    pub sensors: SensorConfig,
    pub mapping: MappingConfig,
    pub planning: PlanningConfig,
    pub control: ControlConfig,
    pub telemetry: TelemetryConfig,
}

/// Ground-truth grid parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid side length in cells.
    pub size: usize,
    /// World units (meters) per cell.
    pub scale: f32,
    /// Occupancy probability above which a world cell is solid.
    pub occupancy_threshold: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: 200,
            scale: 0.1,
            occupancy_threshold: default_occupancy_threshold(),
        }
    }
}

/// Range sensor parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Bearing offsets in degrees, reported in this order.
    pub bearings_deg: Vec<f32>,
    /// Maximum range in cells.
    pub z_max: f32,
    /// Beam opening angle in degrees.
    pub opening_angle_deg: f32,
    /// Gaussian range noise stddev in cells; 0 disables noise.
    pub noise_stddev: f32,
    /// RNG seed for the noise model; 0 seeds from entropy.
    pub noise_seed: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            bearings_deg: vec![0.0, 90.0, -90.0],
            z_max: 40.0,
            opening_angle_deg: 15.0,
            noise_stddev: 0.0,
            noise_seed: 0,
        }
    }
}

impl SensorConfig {
    /// Build the runtime sensor config; the ray-stopping threshold comes
    /// from `[world]` since it qualifies world cells, not the sensor.
    pub fn to_array_config(&self, occupancy_threshold: f32) -> SensorArrayConfig {
        SensorArrayConfig {
            bearings: self.bearings_deg.iter().map(|b| b.to_radians()).collect(),
            z_max: self.z_max,
            occupancy_threshold,
            opening_angle: self.opening_angle_deg.to_radians(),
        }
    }
}

/// Belief fusion parameters, mirroring [`FusionConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub occupied_evidence: f32,
    pub free_evidence: f32,
    pub log_odd_min: f32,
    pub log_odd_max: f32,
    pub hit_band: f32,
}

impl Default for MappingConfig {
    fn default() -> Self {
        let f = FusionConfig::default();
        Self {
            occupied_evidence: f.occupied_evidence,
            free_evidence: f.free_evidence,
            log_odd_min: f.log_odd_min,
            log_odd_max: f.log_odd_max,
            hit_band: f.hit_band,
        }
    }
}

impl MappingConfig {
    pub fn to_fusion_config(&self) -> FusionConfig {
        FusionConfig {
            occupied_evidence: self.occupied_evidence,
            free_evidence: self.free_evidence,
            log_odd_min: self.log_odd_min,
            log_odd_max: self.log_odd_max,
            hit_band: self.hit_band,
            ..FusionConfig::default()
        }
    }
}

/// Planner parameters, mirroring [`PlannerConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    pub occupied_threshold: f32,
    pub allow_diagonal: bool,
    pub max_iterations: usize,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        let p = PlannerConfig::default();
        Self {
            occupied_threshold: p.occupied_threshold,
            allow_diagonal: p.allow_diagonal,
            max_iterations: p.max_iterations,
        }
    }
}

impl PlanningConfig {
    pub fn to_planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            occupied_threshold: self.occupied_threshold,
            allow_diagonal: self.allow_diagonal,
            max_iterations: self.max_iterations,
        }
    }
}

/// Wall-follow loop parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Forward speed in world units per second.
    pub speed: f32,
    /// Steering clamp in degrees per step.
    pub max_steering_deg: f32,
    /// Control tick length in seconds.
    pub tick_seconds: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            speed: 0.2,
            max_steering_deg: 90.0,
            tick_seconds: 0.1,
        }
    }
}

/// Status reporting parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub addr: String,
    /// Report every N simulation steps.
    pub report_interval: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "127.0.0.1:7878".to_string(),
            report_interval: 10,
        }
    }
}

fn default_occupancy_threshold() -> f32 {
    0.5
}

impl Config {
    /// Load from a TOML file; unknown keys are rejected by serde only when
    /// misspelled inside known tables, missing keys take defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.world.size, 200);
        assert_eq!(config.sensors.bearings_deg, vec![0.0, 90.0, -90.0]);
        assert!(!config.telemetry.enabled);
    }

    #[test]
    fn test_partial_override() {
        let config: Config = toml::from_str(
            r#"
            [world]
            size = 120

            [sensors]
            noise_stddev = 0.5
            noise_seed = 42

            [telemetry]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.world.size, 120);
        // Untouched fields keep their defaults
        assert_eq!(config.world.scale, 0.1);
        assert_eq!(config.sensors.noise_stddev, 0.5);
        assert_eq!(config.sensors.noise_seed, 42);
        assert!(config.telemetry.enabled);
        assert_eq!(config.telemetry.report_interval, 10);
    }

    #[test]
    fn test_bearings_converted_to_radians() {
        let config = Config::default();
        let array = config
            .sensors
            .to_array_config(config.world.occupancy_threshold);
        approx::assert_relative_eq!(array.bearings[1], std::f32::consts::FRAC_PI_2);
        approx::assert_relative_eq!(array.opening_angle, 15.0_f32.to_radians());
    }

    #[test]
    fn test_world_occupancy_threshold_reaches_sensors() {
        let config: Config = toml::from_str(
            r#"
            [world]
            occupancy_threshold = 0.99
            "#,
        )
        .unwrap();

        let array = config
            .sensors
            .to_array_config(config.world.occupancy_threshold);
        approx::assert_relative_eq!(array.occupancy_threshold, 0.99);
    }

    #[test]
    fn test_malformed_toml_is_a_config_error() {
        let err = toml::from_str::<Config>("[world]\nsize = \"huge\"").unwrap_err();
        assert!(err.to_string().contains("size"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stellar.toml");
        std::fs::write(&path, "[control]\nspeed = 0.5\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.control.speed, 0.5);
    }
}
