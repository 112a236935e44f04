//! Correlated multi-jittered sampler (§4.2 "Multi-jittered (Kensler)").
//!
//! Reproduces Andrew Kensler's "Correlated Multi-Jittered Sampling"
//! permutation exactly, including the documented magic constants, since the
//! spec requires deterministic re-runs with the same seed to produce
//! identical images — any deviation from the canonical permutation would
//! still be "a" multi-jitter sampler but not *this* one.

use super::Sampler;

pub struct MultiJitteredSampler {
    samples: u32,
    m: u32,
    n: u32,
    seed: u32,
}

impl MultiJitteredSampler {
    #[must_use]
    pub fn new(seed: u64, samples: u32) -> Self {
        let samples = samples.max(1);
        let m = (samples as f32).sqrt() as u32;
        let m = m.max(1);
        let n = (samples + m - 1) / m;
        Self {
            samples,
            m,
            n,
            seed: seed as u32,
        }
    }

    fn permute(mut i: u32, l: u32, p: u32) -> u32 {
        let w = l.wrapping_sub(1);
        if w == 0 {
            return 0;
        }
        if l & w == 0 {
            // power of two
            i ^= p;
            i = i.wrapping_mul(0xe170_893d);
            i ^= p >> 16;
            i ^= (i & w) >> 4;
            i ^= p >> 8;
            i = i.wrapping_mul(0x0929_eb3f);
            i ^= p >> 23;
            i ^= (i & w) >> 1;
            i = i.wrapping_mul(1 | p >> 27);
            i = i.wrapping_mul(0x6935_fa69);
            i ^= (i & w) >> 11;
            i = i.wrapping_mul(0x74dc_b303);
            i ^= (i & w) >> 2;
            i = i.wrapping_mul(0x9e50_1cc3);
            i ^= (i & w) >> 2;
            i = i.wrapping_mul(0xc860_a3df);
            i &= w;
            i ^= i >> 5;
            (i.wrapping_add(p)) & w
        } else {
            let mut w = w;
            w |= w >> 1;
            w |= w >> 2;
            w |= w >> 4;
            w |= w >> 8;
            w |= w >> 16;
            loop {
                i ^= p;
                i = i.wrapping_mul(0xe170_893d);
                i ^= p >> 16;
                i ^= (i & w) >> 4;
                i ^= p >> 8;
                i = i.wrapping_mul(0x0929_eb3f);
                i ^= p >> 23;
                i ^= (i & w) >> 1;
                i = i.wrapping_mul(1 | p >> 27);
                i = i.wrapping_mul(0x6935_fa69);
                i ^= (i & w) >> 11;
                i = i.wrapping_mul(0x74dc_b303);
                i ^= (i & w) >> 2;
                i = i.wrapping_mul(0x9e50_1cc3);
                i ^= (i & w) >> 2;
                i = i.wrapping_mul(0xc860_a3df);
                i &= w;
                i ^= i >> 5;
                if i < l {
                    break;
                }
            }
            (i.wrapping_add(p)) % l
        }
    }

    fn rand_float(mut i: u32, p: u32) -> f32 {
        i ^= p;
        i ^= i >> 17;
        i ^= i >> 10;
        i = i.wrapping_mul(0xb365_34e5);
        i ^= i >> 12;
        i ^= i >> 21;
        i = i.wrapping_mul(0x93fc_4795);
        i ^= 0xdf6e_307f;
        i ^= i >> 17;
        i = i.wrapping_mul(1 | p >> 18);
        i as f32 * (1.0 / 4_294_967_808.0)
    }
}

impl Sampler for MultiJitteredSampler {
    fn generate_1d(&self, index: u32) -> f32 {
        let i = index % self.samples;
        let p = self.seed;
        let s = Self::permute(i, self.samples, p.wrapping_mul(0xa511_e9b3));
        let j = Self::rand_float(i, p.wrapping_mul(0xa399_d265));
        // `s` decorrelates which stratum index we jitter within so repeat
        // calls at the same seed still land on distinct strata overall.
        (s as f32 + j) / self.samples as f32
    }

    fn generate_2d(&self, index: u32) -> (f32, f32) {
        let i = index;
        let p = self.seed;
        let sx = Self::permute(i % self.m, self.m, p.wrapping_mul(0xa511_e9b3));
        let sy = Self::permute(i / self.m, self.n, p.wrapping_mul(0x63d8_3595));
        let jx = Self::rand_float(i, p.wrapping_mul(0xa399_d265));
        let jy = Self::rand_float(i, p.wrapping_mul(0x711a_d6a5));
        let x = ((i % self.m) as f32 + (sy as f32 + jx) / self.n as f32) / self.m as f32;
        let y = ((i / self.m) as f32 + (sx as f32 + jy) / self.m as f32) / self.n as f32;
        (x, y)
    }

    fn generate_3d(&self, index: u32) -> (f32, f32, f32) {
        let x = self.generate_1d(index);
        let (y, z) = self.generate_2d(index);
        (x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_reproduces_identical_sequence() {
        let a = MultiJitteredSampler::new(42, 16);
        let b = MultiJitteredSampler::new(42, 16);
        for i in 0..16 {
            assert_eq!(a.generate_2d(i).0, b.generate_2d(i).0);
            assert_eq!(a.generate_2d(i).1, b.generate_2d(i).1);
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let a = MultiJitteredSampler::new(1, 16);
        let b = MultiJitteredSampler::new(2, 16);
        let diverges = (0..16).any(|i| a.generate_2d(i) != b.generate_2d(i));
        assert!(diverges);
    }

    #[test]
    fn samples_stay_in_unit_square() {
        let s = MultiJitteredSampler::new(7, 25);
        for i in 0..25 {
            let (x, y) = s.generate_2d(i);
            assert!((0.0..1.0).contains(&x), "x={x}");
            assert!((0.0..1.0).contains(&y), "y={y}");
        }
    }
}
