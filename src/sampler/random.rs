//! Independent uniform sampler (§4.2 "Random").

use super::Sampler;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::cell::RefCell;

/// Stateless aside from an injected RNG — seeded once at construction so
/// that `(seed, sample index)` still determines the sequence, even though
/// individual draws are not indexable the way QMC sequences are.
pub struct RandomSampler {
    rng: RefCell<Xoshiro256PlusPlus>,
}

impl RandomSampler {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RefCell::new(Xoshiro256PlusPlus::seed_from_u64(seed)),
        }
    }
}

impl Sampler for RandomSampler {
    fn generate_1d(&self, _index: u32) -> f32 {
        self.rng.borrow_mut().random::<f32>()
    }

    fn generate_2d(&self, _index: u32) -> (f32, f32) {
        let mut rng = self.rng.borrow_mut();
        (rng.random::<f32>(), rng.random::<f32>())
    }

    fn generate_3d(&self, _index: u32) -> (f32, f32, f32) {
        let mut rng = self.rng.borrow_mut();
        (rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>())
    }
}
