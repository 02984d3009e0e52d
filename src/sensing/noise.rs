//! Seeded Gaussian noise for simulated range readings.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

/// Noise generator with a configurable seed for reproducibility.
///
/// Seed 0 draws entropy from the OS; any other seed is deterministic.
#[derive(Debug, Clone)]
pub struct NoiseModel {
    rng: SmallRng,
    stddev: f32,
}

impl NoiseModel {
    pub fn new(stddev: f32, seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng, stddev }
    }

    /// Gaussian range perturbation in cells.
    #[inline]
    pub fn range_jitter(&mut self) -> f32 {
        if self.stddev == 0.0 {
            return 0.0;
        }
        let n: f32 = self.rng.sample(StandardNormal);
        n * self.stddev
    }
}
