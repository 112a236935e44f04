//! Spectral and parametric blobs (§3 Data Model).

use bytemuck::{Pod, Zeroable};

/// Number of hero wavelengths carried per ray/spectral sample.
pub const HERO_WAVELENGTH_COUNT: usize = 4;

/// A fixed-size quartet of radiometric values, one per hero wavelength.
///
/// Every radiometric quantity in the engine (throughput, BSDF value,
/// emission, photon power, ...) is carried as a `SpectralBlob`. RGB
/// conversion happens only at output write time.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SpectralBlob([f32; HERO_WAVELENGTH_COUNT]);

impl SpectralBlob {
    /// The zero spectrum.
    pub const ZERO: Self = Self([0.0; HERO_WAVELENGTH_COUNT]);

    #[must_use]
    pub fn splat(v: f32) -> Self {
        Self([v; HERO_WAVELENGTH_COUNT])
    }

    #[must_use]
    pub fn from_array(values: [f32; HERO_WAVELENGTH_COUNT]) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_array(&self) -> [f32; HERO_WAVELENGTH_COUNT] {
        self.0
    }

    #[must_use]
    pub fn get(&self, i: usize) -> f32 {
        self.0[i]
    }

    pub fn set(&mut self, i: usize, v: f32) {
        self.0[i] = v;
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    #[must_use]
    pub fn has_negative(&self) -> bool {
        self.0.iter().any(|v| *v < 0.0)
    }

    #[must_use]
    pub fn max_component(&self) -> f32 {
        self.0.iter().copied().fold(f32::MIN, f32::max)
    }

    #[must_use]
    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    #[must_use]
    pub fn average(&self) -> f32 {
        self.sum() / HERO_WAVELENGTH_COUNT as f32
    }

    /// Linear interpolation toward `other` by `t` (used by the output
    /// framebuffer's auxiliary-channel update, §4.7).
    #[must_use]
    pub fn lerp(&self, other: Self, t: f32) -> Self {
        let mut out = [0.0; HERO_WAVELENGTH_COUNT];
        for i in 0..HERO_WAVELENGTH_COUNT {
            out[i] = self.0[i] * (1.0 - t) + other.0[i] * t;
        }
        Self(out)
    }

    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        let mut out = [0.0; HERO_WAVELENGTH_COUNT];
        for i in 0..HERO_WAVELENGTH_COUNT {
            out[i] = f(self.0[i]);
        }
        Self(out)
    }
}

impl std::ops::Add for SpectralBlob {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let mut out = self.0;
        for i in 0..HERO_WAVELENGTH_COUNT {
            out[i] += rhs.0[i];
        }
        Self(out)
    }
}

impl std::ops::AddAssign for SpectralBlob {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for SpectralBlob {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let mut out = self.0;
        for i in 0..HERO_WAVELENGTH_COUNT {
            out[i] -= rhs.0[i];
        }
        Self(out)
    }
}

impl std::ops::Mul for SpectralBlob {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let mut out = self.0;
        for i in 0..HERO_WAVELENGTH_COUNT {
            out[i] *= rhs.0[i];
        }
        Self(out)
    }
}

impl std::ops::Mul<f32> for SpectralBlob {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        let mut out = self.0;
        for v in &mut out {
            *v *= rhs;
        }
        Self(out)
    }
}

impl std::ops::MulAssign for SpectralBlob {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl std::ops::MulAssign<f32> for SpectralBlob {
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl std::ops::Div<f32> for SpectralBlob {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        self * (1.0 / rhs)
    }
}

/// Three Jakob-Hanika coefficients (a, b, c) encoding a smooth spectral
/// curve, evaluated per-wavelength by [`super::upsampler::compute_single`].
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParametricBlob {
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl ParametricBlob {
    #[must_use]
    pub fn new(a: f32, b: f32, c: f32) -> Self {
        Self { a, b, c }
    }
}
