//! Regular-lattice sampler (§4.2 "Uniform").

use super::Sampler;

/// A regular 1D lattice; 2D uses `sqrt(N) x ceil(N / sqrt(N))`, matching
/// the original `UniformSampler`.
pub struct UniformSampler {
    samples: u32,
    grid_x: u32,
    grid_y: u32,
}

impl UniformSampler {
    #[must_use]
    pub fn new(samples: u32) -> Self {
        let samples = samples.max(1);
        let grid_x = (samples as f32).sqrt() as u32;
        let grid_x = grid_x.max(1);
        let grid_y = (samples + grid_x - 1) / grid_x;
        Self {
            samples,
            grid_x,
            grid_y,
        }
    }
}

impl Sampler for UniformSampler {
    fn generate_1d(&self, index: u32) -> f32 {
        (index % self.samples) as f32 / self.samples as f32 + 0.5 / self.samples as f32
    }

    fn generate_2d(&self, index: u32) -> (f32, f32) {
        let x = index % self.grid_x;
        let y = index / self.grid_x;
        (
            (x as f32 + 0.5) / self.grid_x as f32,
            (y as f32 + 0.5) / self.grid_y as f32,
        )
    }

    fn generate_3d(&self, index: u32) -> (f32, f32, f32) {
        let (x, y) = self.generate_2d(index);
        let z = self.generate_1d(index / (self.grid_x * self.grid_y).max(1));
        (x, y, z)
    }
}
