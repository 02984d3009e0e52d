//! Log-odds occupancy belief grid and inverse sensor model.
//!
//! ```text
//! P(occupied) = 1 / (1 + exp(-log_odds))
//! update: log_odds += evidence, clamped to [log_odd_min, log_odd_max]
//! ```
//!
//! Additive log-odds updates keep repeated noisy range readings numerically
//! stable: evidence accumulates by addition and the clamp stops runaway
//! certainty. 0.0 is "unknown".

pub mod serialization;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::math::angle_diff;
use crate::core::GridPose;
use crate::error::Result;
use crate::sensing::RayIter;

/// Coarse cell classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Unknown,
    Free,
    Occupied,
}

/// Tunables for the inverse sensor model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Evidence added to a cell in the hit band. Positive.
    pub occupied_evidence: f32,

    /// Evidence added to a cell the beam passed through. Negative.
    pub free_evidence: f32,

    /// Lower clamp for every cell value.
    pub log_odd_min: f32,

    /// Upper clamp for every cell value.
    pub log_odd_max: f32,

    /// Half-width of the band around the measured distance treated as the
    /// hit, in cells. The falloff shape is a tunable, not a fixed formula.
    pub hit_band: f32,

    /// Log-odds above which a cell reads as occupied.
    pub occupied_threshold: f32,

    /// Log-odds below which a cell reads as free.
    pub free_threshold: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            occupied_evidence: 0.9,
            free_evidence: -0.7,
            log_odd_min: -10.0,
            log_odd_max: 10.0,
            hit_band: 1.0,
            occupied_threshold: 0.5,
            free_threshold: -0.5,
        }
    }
}

/// 2-D grid of clamped log-odds occupancy beliefs.
///
/// Row-major storage addressed `(row, col)`; dimensions are fixed at
/// construction and live for the whole session.
#[derive(Debug, Clone)]
pub struct BeliefGrid {
    config: FusionConfig,
    /// Log-odds values, row-major: index = row * width + col.
    cells: Vec<f32>,
    width: usize,
    height: usize,
}

impl BeliefGrid {
    /// Create an all-unknown belief grid.
    pub fn new(width: usize, height: usize, config: FusionConfig) -> Self {
        Self {
            config,
            cells: vec![0.0; width * height],
            width,
            height,
        }
    }

    /// Rebuild from raw cells (used by serialization).
    pub(crate) fn from_raw(
        config: FusionConfig,
        cells: Vec<f32>,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            config,
            cells,
            width,
            height,
        }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Log-odds at `(row, col)`; out-of-bounds reads as unknown.
    #[inline]
    pub fn log_odds(&self, row: i32, col: i32) -> f32 {
        if self.contains(row, col) {
            self.cells[row as usize * self.width + col as usize]
        } else {
            0.0
        }
    }

    /// Occupancy probability at `(row, col)` via the logistic transform.
    #[inline]
    pub fn probability(&self, row: i32, col: i32) -> f32 {
        1.0 / (1.0 + (-self.log_odds(row, col)).exp())
    }

    /// Classify a cell against the config thresholds.
    pub fn state(&self, row: i32, col: i32) -> CellState {
        let value = self.log_odds(row, col);
        if value >= self.config.occupied_threshold {
            CellState::Occupied
        } else if value <= self.config.free_threshold {
            CellState::Free
        } else {
            CellState::Unknown
        }
    }

    #[inline]
    pub fn contains(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.height && (col as usize) < self.width
    }

    /// `(free, unknown, occupied)` cell counts.
    pub fn count_cells(&self) -> (usize, usize, usize) {
        let mut free = 0;
        let mut unknown = 0;
        let mut occupied = 0;
        for &value in &self.cells {
            if value >= self.config.occupied_threshold {
                occupied += 1;
            } else if value <= self.config.free_threshold {
                free += 1;
            } else {
                unknown += 1;
            }
        }
        (free, unknown, occupied)
    }

    /// Add evidence to one cell, clamped into the configured range.
    #[inline]
    fn add_evidence(&mut self, row: i32, col: i32, evidence: f32) {
        if !self.contains(row, col) {
            return;
        }
        let idx = row as usize * self.width + col as usize;
        self.cells[idx] =
            (self.cells[idx] + evidence).clamp(self.config.log_odd_min, self.config.log_odd_max);
    }

    /// Fuse one range reading into the belief grid.
    ///
    /// Inverse sensor model over the beam's angular cone: every cell within
    /// `z_max` of `origin` and within `opening_angle / 2` of the beam
    /// direction `theta + bearing` gets evidence. Cells in the hit band
    /// around `distance` move toward occupied, nearer cells toward free,
    /// cells beyond the hit stay untouched (no evidence either way). A
    /// [`crate::sensing::NO_DETECTION`] distance frees the whole cone.
    ///
    /// Repeated identical observations saturate at the clamp bounds and
    /// then stop changing.
    pub fn fuse(
        &mut self,
        origin: GridPose,
        theta: f32,
        distance: f32,
        bearing: f32,
        opening_angle: f32,
        z_max: f32,
    ) {
        let beam_angle = theta + bearing;
        let half_cone = opening_angle / 2.0;
        let radius = z_max.ceil() as i32;
        let no_detection = distance < 0.0;

        for row in (origin.row - radius)..=(origin.row + radius) {
            for col in (origin.col - radius)..=(origin.col + radius) {
                if !self.contains(row, col) {
                    continue;
                }

                let dx = (col - origin.col) as f32;
                let dy = (row - origin.row) as f32;
                let r = (dx * dx + dy * dy).sqrt();
                if r > z_max {
                    continue;
                }

                let phi = angle_diff(beam_angle, dy.atan2(dx));
                if phi.abs() > half_cone && r > 0.0 {
                    continue;
                }

                if no_detection {
                    // Beam saw nothing: the whole cone is evidence of free space
                    self.add_evidence(row, col, self.config.free_evidence);
                } else if (r - distance).abs() <= self.config.hit_band {
                    self.add_evidence(row, col, self.config.occupied_evidence);
                } else if r < distance {
                    self.add_evidence(row, col, self.config.free_evidence);
                }
                // Beyond the hit band: no evidence, cell untouched
            }
        }
    }

    /// Rasterize a hard obstacle segment between two cells.
    ///
    /// Every cell on the discrete line is pinned to `log_odd_max`, with
    /// one-cell thickening so a diagonal boundary cannot be slipped
    /// through. Used to connect landmark positions into track boundaries
    /// before offline planning.
    pub fn stamp_segment(&mut self, a: GridPose, b: GridPose) {
        let ceiling = self.config.log_odd_max;
        for (col, row) in RayIter::new(a.col, a.row, b.col, b.row) {
            self.set_log_odds(row, col, ceiling);
            self.set_log_odds(row + 1, col, ceiling);
            self.set_log_odds(row, col + 1, ceiling);
        }
    }

    #[inline]
    fn set_log_odds(&mut self, row: i32, col: i32, value: f32) {
        if self.contains(row, col) {
            self.cells[row as usize * self.width + col as usize] =
                value.clamp(self.config.log_odd_min, self.config.log_odd_max);
        }
    }

    /// Save to a binary dump.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        serialization::save(self, path)
    }

    /// Load from a binary dump. Malformed files are fatal to the caller.
    pub fn load<P: AsRef<Path>>(path: P, config: FusionConfig) -> Result<Self> {
        serialization::load(path, config)
    }
}
