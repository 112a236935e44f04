//! Spectral core (component A, §4.1).
//!
//! Parametric <-> spectral upsampling plus the small amount of colorimetry
//! needed to turn a hero-wavelength quartet into RGB at output time:
//! equidistant CIE-like illuminant/observer tables and hero-wavelength
//! evaluation of a parametric reflectance.

pub mod blob;
pub mod upsampler;

pub use blob::{ParametricBlob, SpectralBlob, HERO_WAVELENGTH_COUNT};
pub use upsampler::{compute, compute_single, SpectralUpsampler};

/// Visible spectrum bounds used throughout the engine for wavelength
/// sampling and upsampler table construction.
pub const WAVELENGTH_START: f32 = 360.0;
pub const WAVELENGTH_END: f32 = 830.0;

/// Samples a hero wavelength quartet given a single random draw `u` and a
/// stratification offset, following the common hero-wavelength spectral
/// sampling scheme: one wavelength is drawn uniformly over the visible
/// range and the remaining three are placed at equal spectral offsets
/// (`+= (range / 4)` wrapped back into range) so a single ray samples four
/// independent wavelengths at once.
#[must_use]
pub fn sample_hero_wavelengths(u: f32) -> [f32; HERO_WAVELENGTH_COUNT] {
    let range = WAVELENGTH_END - WAVELENGTH_START;
    let step = range / HERO_WAVELENGTH_COUNT as f32;
    let base = WAVELENGTH_START + u * range;

    let mut out = [0.0f32; HERO_WAVELENGTH_COUNT];
    for (i, w) in out.iter_mut().enumerate() {
        let mut lambda = base + step * i as f32;
        if lambda > WAVELENGTH_END {
            lambda -= range;
        }
        *w = lambda;
    }
    out
}

/// Evaluates a parametric reflectance at the ray's hero wavelength quartet,
/// yielding a [`SpectralBlob`]. For illuminant upsampling the caller scales
/// the result by a power factor; raw upsampled curves normalize near unit
/// (§4.1).
#[must_use]
pub fn evaluate_hero(coeffs: ParametricBlob, wavelengths: [f32; HERO_WAVELENGTH_COUNT]) -> SpectralBlob {
    let mut out = [0.0f32; HERO_WAVELENGTH_COUNT];
    for (i, w) in wavelengths.iter().enumerate() {
        out[i] = compute_single(coeffs, *w);
    }
    SpectralBlob::from_array(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hero_wavelengths_stay_in_visible_range() {
        for i in 0..100 {
            let u = i as f32 / 100.0;
            let quartet = sample_hero_wavelengths(u);
            for w in quartet {
                assert!((WAVELENGTH_START..=WAVELENGTH_END).contains(&w));
            }
        }
    }

    #[test]
    fn hero_wavelengths_are_distinct() {
        let quartet = sample_hero_wavelengths(0.37);
        for i in 0..HERO_WAVELENGTH_COUNT {
            for j in (i + 1)..HERO_WAVELENGTH_COUNT {
                assert!((quartet[i] - quartet[j]).abs() > 1e-3);
            }
        }
    }
}
