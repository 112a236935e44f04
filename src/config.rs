//! Render settings (§4.13 ambient configuration, §6 CLI-facing subset).
//!
//! A plain struct built with `Default` plus builder-style setters and
//! validated once at construction (§7.1: a bad setting is a configuration
//! error, the render never starts) — the Rust-native analogue of the
//! original's `RenderSettings.h`, without the registry-backed bridge to
//! scene-description parsing, which is out of scope (§1).

use crate::error::{PearRayError, Result};
use crate::render::TileLayout;
use crate::sampler::SamplerMode;

/// Crop rectangle in normalized `[0, 1]` image coordinates (§6 `--crop`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub xmin: f32,
    pub xmax: f32,
    pub ymin: f32,
    pub ymax: f32,
}

impl Default for CropRect {
    fn default() -> Self {
        Self { xmin: 0.0, xmax: 1.0, ymin: 0.0, ymax: 1.0 }
    }
}

impl CropRect {
    /// Resolves the crop against a concrete image resolution, returning
    /// `(sx, ex, sy, ey)` pixel bounds. A zero-area crop yields `sx == ex`
    /// or `sy == ey` (§8 "Crop rectangle of zero area: render completes
    /// instantly with empty output").
    #[must_use]
    pub fn pixel_bounds(&self, image_w: u32, image_h: u32) -> (u32, u32, u32, u32) {
        let sx = (self.xmin * image_w as f32).round() as u32;
        let ex = (self.xmax * image_w as f32).round() as u32;
        let sy = (self.ymin * image_h as f32).round() as u32;
        let ey = (self.ymax * image_h as f32).round() as u32;
        (sx.min(image_w), ex.min(image_w), sy.min(image_h), ey.min(image_h))
    }
}

/// Which canonical integrator (§4.9) drives the render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorKind {
    Direct,
    Bidirectional,
    Ppm,
}

#[derive(Debug, Clone, Copy)]
pub struct DirectSettings {
    /// BSDF hemisphere samples per hit (§4.9 "hemisphere-sample the BSDF
    /// `N_aa` times").
    pub bsdf_samples: u32,
    /// Area-light samples per light per hit.
    pub light_samples: u32,
    /// Power-heuristic exponent, default `beta = 2` (§4.3).
    pub mis_power_beta: f32,
}

impl Default for DirectSettings {
    fn default() -> Self {
        Self { bsdf_samples: 1, light_samples: 1, mis_power_beta: 2.0 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BidirectionalSettings {
    pub max_light_depth: u32,
    pub max_camera_depth: u32,
    /// Epsilon on the intersection distance used by the connection
    /// visibility test (§4.9 "verify visibility ... with an epsilon on the
    /// intersection distance").
    pub connection_epsilon: f32,
}

impl Default for BidirectionalSettings {
    fn default() -> Self {
        Self { max_light_depth: 4, max_camera_depth: 4, connection_epsilon: 1e-3 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PpmSettings {
    /// Total even+odd passes (photon pass + gather pass alternation, §4.9).
    pub pass_count: u32,
    pub photons_per_pass: u32,
    /// Fraction of `photons_per_pass` every light receives at minimum
    /// (§4.9 "floor of `min_photons = 0.1 * photons_per_pass` per light").
    pub min_photons_fraction: f32,
    pub initial_radius_sqr: f32,
    /// `alpha = 1 - contract_ratio` in the stochastic update rule (§4.9).
    pub contract_ratio: f32,
    pub squeeze_weight: f32,
    pub cone_k: f32,
    pub max_diffuse_bounces: u32,
    pub use_projection_map: bool,
    pub projection_map_resolution: u32,
    pub caustic_preference: f32,
}

impl Default for PpmSettings {
    fn default() -> Self {
        Self {
            pass_count: 10,
            photons_per_pass: 100_000,
            min_photons_fraction: 0.1,
            initial_radius_sqr: 0.01,
            contract_ratio: 2.0 / 3.0,
            squeeze_weight: 1.0,
            cone_k: 1.1,
            max_diffuse_bounces: 4,
            use_projection_map: false,
            projection_map_resolution: 32,
            caustic_preference: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdaptiveSettings {
    pub enabled: bool,
    pub target_quality: f32,
    pub min_samples: u32,
    pub max_samples: u32,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self { enabled: false, target_quality: 0.01, min_samples: 16, max_samples: 256 }
    }
}

/// Top-level render configuration: everything a render context needs
/// besides the scene itself.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub seed: u64,
    /// `0` means "use hardware concurrency" (§6 `--threads`).
    pub thread_count: usize,
    pub tile_layout: TileLayout,
    /// `None` derives the size from [`crate::render::default_tile_size`].
    pub tile_size: Option<u32>,
    pub crop: CropRect,
    pub max_ray_depth: u32,
    pub sampler_mode: SamplerMode,
    pub max_parallel_rays: usize,
    pub sort_hits: bool,
    /// Non-adaptive sample count per pixel; ignored when `adaptive.enabled`.
    pub samples_per_pixel: u32,
    pub integrator: IntegratorKind,
    pub direct: DirectSettings,
    pub bidirectional: BidirectionalSettings,
    pub ppm: PpmSettings,
    pub adaptive: AdaptiveSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            thread_count: 0,
            tile_layout: TileLayout::Linear,
            tile_size: None,
            crop: CropRect::default(),
            max_ray_depth: 8,
            sampler_mode: SamplerMode::Random,
            max_parallel_rays: 4096,
            sort_hits: true,
            samples_per_pixel: 16,
            integrator: IntegratorKind::Direct,
            direct: DirectSettings::default(),
            bidirectional: BidirectionalSettings::default(),
            ppm: PpmSettings::default(),
            adaptive: AdaptiveSettings::default(),
        }
    }
}

impl RenderSettings {
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_thread_count(mut self, n: usize) -> Self {
        self.thread_count = n;
        self
    }

    #[must_use]
    pub fn with_crop(mut self, crop: CropRect) -> Self {
        self.crop = crop;
        self
    }

    #[must_use]
    pub fn with_integrator(mut self, kind: IntegratorKind) -> Self {
        self.integrator = kind;
        self
    }

    #[must_use]
    pub fn resolved_thread_count(&self) -> usize {
        if self.thread_count == 0 {
            std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(1)
        } else {
            self.thread_count
        }
    }

    #[must_use]
    pub fn effective_max_samples(&self) -> u32 {
        if self.adaptive.enabled {
            self.adaptive.max_samples
        } else {
            self.samples_per_pixel
        }
    }

    /// Validates cross-field invariants (§7.1: surfaced at load time,
    /// before any worker thread starts).
    pub fn validate(&self) -> Result<()> {
        let c = &self.crop;
        for (name, v) in [("crop.xmin", c.xmin), ("crop.xmax", c.xmax), ("crop.ymin", c.ymin), ("crop.ymax", c.ymax)] {
            if !(0.0..=1.0).contains(&v) {
                return Err(PearRayError::InvalidParameter {
                    name: name.into(),
                    reason: "must lie in [0, 1]".into(),
                });
            }
        }
        if c.xmin > c.xmax || c.ymin > c.ymax {
            return Err(PearRayError::InvalidParameter {
                name: "crop".into(),
                reason: "min bound exceeds max bound".into(),
            });
        }
        if self.adaptive.enabled && self.adaptive.min_samples > self.adaptive.max_samples {
            return Err(PearRayError::InvalidParameter {
                name: "adaptive.min_samples".into(),
                reason: "exceeds adaptive.max_samples".into(),
            });
        }
        if self.ppm.pass_count == 0 && self.integrator == IntegratorKind::Ppm {
            return Err(PearRayError::InvalidParameter {
                name: "ppm.pass_count".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        assert!(RenderSettings::default().validate().is_ok());
    }

    #[test]
    fn inverted_crop_is_rejected() {
        let mut s = RenderSettings::default();
        s.crop.xmin = 0.8;
        s.crop.xmax = 0.2;
        assert!(s.validate().is_err());
    }

    #[test]
    fn out_of_range_crop_is_rejected() {
        let mut s = RenderSettings::default();
        s.crop.xmax = 1.5;
        assert!(s.validate().is_err());
    }

    #[test]
    fn adaptive_min_over_max_is_rejected() {
        let mut s = RenderSettings::default();
        s.adaptive.enabled = true;
        s.adaptive.min_samples = 100;
        s.adaptive.max_samples = 10;
        assert!(s.validate().is_err());
    }

    #[test]
    fn zero_area_crop_resolves_to_empty_bounds() {
        let crop = CropRect { xmin: 0.4, xmax: 0.4, ymin: 0.0, ymax: 1.0 };
        let (sx, ex, ..) = crop.pixel_bounds(100, 100);
        assert_eq!(sx, ex);
    }
}
