//! Sampler set (component C, §4.2).
//!
//! All samplers are deterministic functions of `(seed, sample index)` so
//! that re-runs with the same seed reproduce identical images (§5
//! "Deterministic replay"). Every sampler implements the [`Sampler`] trait;
//! batched SIMD-lane generation (`generateNDv` in the spec) is modeled as
//! `generate_lanes`, returning a `Vec` rather than a literal SIMD type since
//! the engine has no fixed lane width requirement beyond "batched".

pub mod halton;
pub mod multi_jittered;
pub mod random;
pub mod sobol;
pub mod stratified;
pub mod uniform;

pub use halton::HaltonSampler;
pub use multi_jittered::MultiJitteredSampler;
pub use random::RandomSampler;
pub use sobol::SobolSampler;
pub use stratified::StratifiedSampler;
pub use uniform::UniformSampler;

/// Common contract every low-discrepancy generator in §4.2 satisfies.
pub trait Sampler {
    fn generate_1d(&self, index: u32) -> f32;
    fn generate_2d(&self, index: u32) -> (f32, f32);
    fn generate_3d(&self, index: u32) -> (f32, f32, f32);

    /// Batched generation over a contiguous range of indices, the spec's
    /// `generateNDv`.
    fn generate_1d_lanes(&self, start_index: u32, count: u32) -> Vec<f32> {
        (0..count).map(|i| self.generate_1d(start_index + i)).collect()
    }
}

/// Which [`Sampler`] implementation to instantiate for a given render
/// dimension (AA / lens / time / spectral), selected by
/// [`crate::config::RenderSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerMode {
    Random,
    Uniform,
    Stratified,
    MultiJitter,
    HaltonQmc,
    Sobol,
}

/// Owned, dynamically-dispatched sampler instance, one per `(tile,
/// dimension)` pair (§3 "four independent samplers").
pub enum AnySampler {
    Random(RandomSampler),
    Uniform(UniformSampler),
    Stratified(StratifiedSampler),
    MultiJitter(MultiJitteredSampler),
    HaltonQmc(HaltonSampler),
    Sobol(SobolSampler),
}

impl AnySampler {
    #[must_use]
    pub fn new(mode: SamplerMode, seed: u64, samples: u32) -> Self {
        match mode {
            SamplerMode::Random => Self::Random(RandomSampler::new(seed)),
            SamplerMode::Uniform => Self::Uniform(UniformSampler::new(samples)),
            SamplerMode::Stratified => Self::Stratified(StratifiedSampler::new(seed, samples)),
            SamplerMode::MultiJitter => Self::MultiJitter(MultiJitteredSampler::new(seed, samples)),
            SamplerMode::HaltonQmc => Self::HaltonQmc(HaltonSampler::default()),
            SamplerMode::Sobol => Self::Sobol(SobolSampler::new(seed)),
        }
    }
}

impl Sampler for AnySampler {
    fn generate_1d(&self, index: u32) -> f32 {
        match self {
            Self::Random(s) => s.generate_1d(index),
            Self::Uniform(s) => s.generate_1d(index),
            Self::Stratified(s) => s.generate_1d(index),
            Self::MultiJitter(s) => s.generate_1d(index),
            Self::HaltonQmc(s) => s.generate_1d(index),
            Self::Sobol(s) => s.generate_1d(index),
        }
    }

    fn generate_2d(&self, index: u32) -> (f32, f32) {
        match self {
            Self::Random(s) => s.generate_2d(index),
            Self::Uniform(s) => s.generate_2d(index),
            Self::Stratified(s) => s.generate_2d(index),
            Self::MultiJitter(s) => s.generate_2d(index),
            Self::HaltonQmc(s) => s.generate_2d(index),
            Self::Sobol(s) => s.generate_2d(index),
        }
    }

    fn generate_3d(&self, index: u32) -> (f32, f32, f32) {
        match self {
            Self::Random(s) => s.generate_3d(index),
            Self::Uniform(s) => s.generate_3d(index),
            Self::Stratified(s) => s.generate_3d(index),
            Self::MultiJitter(s) => s.generate_3d(index),
            Self::HaltonQmc(s) => s.generate_3d(index),
            Self::Sobol(s) => s.generate_3d(index),
        }
    }
}
