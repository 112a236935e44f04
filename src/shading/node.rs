//! Shading node arena entries (§9 "nodes live in an arena indexed by id").
//!
//! The original's `FloatSpectralShadingSocket`/`FloatScalarShadingSocket`
//! hierarchy is flattened here into one tagged enum: scene description
//! parsing and image-map sampling are out of scope, so the only node kinds
//! this crate needs are constants and a UVW-driven checker pattern (enough
//! for the furnace/Cornell-box style test scenes this engine targets).

use super::ShadingContext;
use crate::spectral::SpectralBlob;

#[derive(Debug, Clone)]
pub enum ShadingNode {
    ConstScalar(f32),
    ConstSpectral(SpectralBlob),
    /// Two-color UVW checker, swapping every integer unit along `u` and `v`.
    Checker { even: SpectralBlob, odd: SpectralBlob, scale: f32 },
}

impl ShadingNode {
    #[must_use]
    pub fn eval_spectral(&self, closure: &ShadingContext) -> SpectralBlob {
        match self {
            Self::ConstScalar(v) => SpectralBlob::splat(*v),
            Self::ConstSpectral(s) => *s,
            Self::Checker { even, odd, scale } => {
                let u = (closure.uvw.x * scale).floor() as i64;
                let v = (closure.uvw.y * scale).floor() as i64;
                if (u + v) % 2 == 0 { *even } else { *odd }
            }
        }
    }

    #[must_use]
    pub fn eval_scalar(&self, closure: &ShadingContext) -> f32 {
        self.eval_spectral(closure).average()
    }
}
