//! Jittered-stratum sampler (§4.2 "Stratified").

use super::Sampler;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::cell::RefCell;

/// `N` strata on 1D; 2D uses separable `sqrt(N) x sqrt(N)` strata and
/// returns uncorrelated pairs (each axis jittered independently, unlike
/// multi-jittering which correlates them).
pub struct StratifiedSampler {
    samples: u32,
    grid: u32,
    rng: RefCell<Xoshiro256PlusPlus>,
}

impl StratifiedSampler {
    #[must_use]
    pub fn new(seed: u64, samples: u32) -> Self {
        let samples = samples.max(1);
        let grid = (samples as f32).sqrt().round().max(1.0) as u32;
        Self {
            samples,
            grid,
            rng: RefCell::new(Xoshiro256PlusPlus::seed_from_u64(seed)),
        }
    }

    fn jitter(&self) -> f32 {
        self.rng.borrow_mut().random::<f32>()
    }
}

impl Sampler for StratifiedSampler {
    fn generate_1d(&self, index: u32) -> f32 {
        let stratum = index % self.samples;
        (stratum as f32 + self.jitter()) / self.samples as f32
    }

    fn generate_2d(&self, index: u32) -> (f32, f32) {
        let sx = index % self.grid;
        let sy = (index / self.grid) % self.grid;
        (
            (sx as f32 + self.jitter()) / self.grid as f32,
            (sy as f32 + self.jitter()) / self.grid as f32,
        )
    }

    fn generate_3d(&self, index: u32) -> (f32, f32, f32) {
        let (x, y) = self.generate_2d(index);
        (x, y, self.generate_1d(index))
    }
}
