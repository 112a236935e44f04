//! Halton QMC sampler (§4.2 "Halton QMC").
//!
//! Uses bases 13, 47 and 89 for the three generated axes, per the
//! requirement that the low-discrepancy sequence stay decorrelated from the
//! tile/pixel grid (which already covers bases 2/3/5 implicitly through the
//! regular raster). Grounded on the radical-inverse construction in the
//! original `HaltonQMCSampler`.

use super::Sampler;

const BASE_X: u32 = 13;
const BASE_Y: u32 = 47;
const BASE_Z: u32 = 89;

#[derive(Debug, Clone, Copy, Default)]
pub struct HaltonSampler {
    offset: u32,
}

impl HaltonSampler {
    #[must_use]
    pub fn new(offset: u32) -> Self {
        Self { offset }
    }

    fn radical_inverse(mut index: u64, base: u32) -> f32 {
        let base = u64::from(base);
        let inv_base = 1.0_f64 / base as f64;
        let mut inv_base_n = inv_base;
        let mut result = 0.0_f64;
        while index > 0 {
            let digit = index % base;
            result += digit as f64 * inv_base_n;
            inv_base_n *= inv_base;
            index /= base;
        }
        result as f32
    }
}

impl Sampler for HaltonSampler {
    fn generate_1d(&self, index: u32) -> f32 {
        Self::radical_inverse(u64::from(index + self.offset), BASE_X)
    }

    fn generate_2d(&self, index: u32) -> (f32, f32) {
        let i = u64::from(index + self.offset);
        (
            Self::radical_inverse(i, BASE_X),
            Self::radical_inverse(i, BASE_Y),
        )
    }

    fn generate_3d(&self, index: u32) -> (f32, f32, f32) {
        let i = u64::from(index + self.offset);
        (
            Self::radical_inverse(i, BASE_X),
            Self::radical_inverse(i, BASE_Y),
            Self::radical_inverse(i, BASE_Z),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radical_inverse_of_zero_is_zero() {
        assert_eq!(HaltonSampler::radical_inverse(0, BASE_X), 0.0);
    }

    #[test]
    fn radical_inverse_stays_in_unit_interval() {
        for i in 0..500 {
            let v = HaltonSampler::radical_inverse(i, BASE_X);
            assert!((0.0..1.0).contains(&v), "v={v} at i={i}");
        }
    }

    #[test]
    fn consecutive_indices_differ() {
        let s = HaltonSampler::default();
        let a = s.generate_2d(0);
        let b = s.generate_2d(1);
        assert_ne!(a, b);
    }

    #[test]
    fn offset_shifts_the_sequence() {
        let a = HaltonSampler::new(0);
        let b = HaltonSampler::new(17);
        assert_ne!(a.generate_1d(0), b.generate_1d(0));
    }
}
