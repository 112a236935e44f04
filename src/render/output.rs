//! Output framebuffer (component G, §4.7), grounded on the original's
//! `OutputMap`: a named collection of 2D buffers sharing the image
//! resolution, with a mandatory spectral channel plus sample-count and
//! quality/variance auxiliaries.

use crate::scene::{EntityId, MaterialId};
use crate::shading::ShadingContext;
use crate::spectral::SpectralBlob;
use glam::Vec3;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

bitflags::bitflags! {
    /// Per-pixel numerical-fault record (§7 "Runtime numerical faults").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Feedback: u8 {
        const NAN = 1 << 0;
        const INFINITE = 1 << 1;
        const NEGATIVE = 1 << 2;
        const MISSING_MATERIAL = 1 << 3;
        const MISSING_EMISSION = 1 << 4;
    }
}

/// One pixel's accumulated state. Spectral accumulation and the paired
/// Welford variance estimate are guarded together by `lock` (§5 "the
/// spectral channel update is serialized per pixel by CAS on the
/// counter" — modeled here as a per-pixel lock rather than a literal CAS
/// loop, since the update touches more than one word).
struct Pixel {
    lock: RwLock<PixelState>,
    sample_count: AtomicU64,
    feedback: AtomicU32,
}

#[derive(Clone, Copy)]
struct PixelState {
    spectral: SpectralBlob,
    mean: f32,
    m2: f32,
    position: Vec3,
    normal: Vec3,
    normal_g: Vec3,
    tangent: Vec3,
    bitangent: Vec3,
    view: Vec3,
    uvw: Vec3,
    material_id: Option<MaterialId>,
    entity_id: Option<EntityId>,
    time: f32,
    depth: f32,
}

impl Default for PixelState {
    fn default() -> Self {
        Self {
            spectral: SpectralBlob::ZERO,
            mean: 0.0,
            m2: 0.0,
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            normal_g: Vec3::ZERO,
            tangent: Vec3::ZERO,
            bitangent: Vec3::ZERO,
            view: Vec3::ZERO,
            uvw: Vec3::ZERO,
            material_id: None,
            entity_id: None,
            time: 0.0,
            depth: 0.0,
        }
    }
}

impl Default for Pixel {
    fn default() -> Self {
        Self {
            lock: RwLock::new(PixelState::default()),
            sample_count: AtomicU64::new(0),
            feedback: AtomicU32::new(0),
        }
    }
}

pub struct OutputFramebuffer {
    width: u32,
    height: u32,
    min_samples: u64,
    target_quality: Option<f32>,
    pixels: Vec<Pixel>,
}

impl OutputFramebuffer {
    #[must_use]
    pub fn new(width: u32, height: u32, min_samples: u64, target_quality: Option<f32>) -> Self {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        pixels.resize_with((width * height) as usize, Pixel::default);
        Self { width, height, min_samples, target_quality, pixels }
    }

    fn index(&self, pixel: (u32, u32)) -> usize {
        (pixel.1 * self.width + pixel.0) as usize
    }

    /// Discards a numerically-faulty sample instead of pushing it (§7),
    /// recording the fault kind in the pixel's feedback bitset. Logs once
    /// per pixel per fault kind (§4.11): the bitset is the durable record,
    /// the log line is only a developer breadcrumb, so it only fires on
    /// the transition from unset to set.
    pub fn report_fault(&self, pixel: (u32, u32), kind: Feedback) {
        let idx = self.index(pixel);
        let before = self.pixels[idx].feedback.fetch_or(kind.bits().into(), Ordering::Relaxed);
        if Feedback::from_bits_truncate(before as u8).intersection(kind).is_empty() {
            log::warn!("numerical fault {kind:?} at pixel {pixel:?}");
        }
    }

    /// Validates a spectral sample before it is eligible for `push`;
    /// returns the fault kind if any component is non-finite or negative.
    #[must_use]
    pub fn validate(spectral: SpectralBlob) -> Option<Feedback> {
        if !spectral.is_finite() {
            if spectral.as_array().iter().any(|v| v.is_nan()) {
                Some(Feedback::NAN)
            } else {
                Some(Feedback::INFINITE)
            }
        } else if spectral.has_negative() {
            Some(Feedback::NEGATIVE)
        } else {
            None
        }
    }

    /// §4.7 `push`: running-mean spectral update, Welford variance on the
    /// channel average, and lerp of every present auxiliary by `t = 1/(n+1)`.
    pub fn push(&self, pixel: (u32, u32), spectral: SpectralBlob, closure: &ShadingContext) {
        if let Some(fault) = Self::validate(spectral) {
            self.report_fault(pixel, fault);
            return;
        }

        let idx = self.index(pixel);
        let slot = &self.pixels[idx];
        let n = slot.sample_count.load(Ordering::Relaxed);
        let t = 1.0 / (n as f32 + 1.0);

        {
            let mut state = slot.lock.write();
            state.spectral = state.spectral * (1.0 - t) + spectral * t;

            let x = spectral.average();
            let delta = x - state.mean;
            state.mean += delta * t;
            let delta2 = x - state.mean;
            state.m2 += delta * delta2;

            state.position = state.position.lerp(closure.p, t);
            state.normal = state.normal.lerp(closure.n, t);
            state.normal_g = state.normal_g.lerp(closure.ng, t);
            state.tangent = state.tangent.lerp(closure.nx, t);
            state.bitangent = state.bitangent.lerp(closure.ny, t);
            state.view = state.view.lerp(closure.v, t);
            state.uvw = state.uvw.lerp(closure.uvw, t);
            state.time = state.time * (1.0 - t) + closure.time * t;
            state.depth = state.depth * (1.0 - t) + closure.depth as f32 * t;
            // Integer-typed channels are assigned directly, not lerped
            // (§4.7): material/entity id only make sense as the latest
            // hit's own id.
            state.material_id = closure.material_id;
            state.entity_id = closure.entity_id;
        }

        slot.sample_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Overwrite-style update for estimators that converge across passes
    /// rather than averaging i.i.d. samples (§4.9 PPM: the pixel value is
    /// recomputed from the hit-point's running `(r², N, Φ)` state every
    /// gather pass, not blended with the previous estimate). `sample_count`
    /// still advances by one per call so `is_pixel_finished`/progress
    /// reporting treat a gather round the same as an ordinary sample, and
    /// the quality channel still tracks convergence via Welford variance
    /// of the overwritten value.
    pub fn set_estimate(&self, pixel: (u32, u32), spectral: SpectralBlob, closure: &ShadingContext) {
        if let Some(fault) = Self::validate(spectral) {
            self.report_fault(pixel, fault);
            return;
        }

        let idx = self.index(pixel);
        let slot = &self.pixels[idx];
        let n = slot.sample_count.load(Ordering::Relaxed);
        let t = 1.0 / (n as f32 + 1.0);

        {
            let mut state = slot.lock.write();
            state.spectral = spectral;

            let x = spectral.average();
            let delta = x - state.mean;
            state.mean += delta * t;
            let delta2 = x - state.mean;
            state.m2 += delta * delta2;

            state.position = closure.p;
            state.normal = closure.n;
            state.normal_g = closure.ng;
            state.tangent = closure.nx;
            state.bitangent = closure.ny;
            state.view = closure.v;
            state.uvw = closure.uvw;
            state.time = closure.time;
            state.depth = closure.depth as f32;
            state.material_id = closure.material_id;
            state.entity_id = closure.entity_id;
        }

        slot.sample_count.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn sample_count(&self, pixel: (u32, u32)) -> u64 {
        self.pixels[self.index(pixel)].sample_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn spectral(&self, pixel: (u32, u32)) -> SpectralBlob {
        self.pixels[self.index(pixel)].lock.read().spectral
    }

    /// Welford-derived sample variance of the per-pixel scalar average,
    /// the "quality" channel §4.7 refers to.
    #[must_use]
    pub fn quality(&self, pixel: (u32, u32)) -> f32 {
        let idx = self.index(pixel);
        let n = self.pixels[idx].sample_count.load(Ordering::Relaxed);
        if n < 2 {
            return f32::INFINITY;
        }
        self.pixels[idx].lock.read().m2 / (n as f32 - 1.0)
    }

    /// §4.7 auxiliary channels: running-average geometric state at this
    /// pixel, lerped in by every `push`/`set_estimate` call. Dead weight
    /// for a renderer that only ever asks for the spectral channel, but
    /// present so an `ImageWriter` can surface position/normal/depth AOVs.
    #[must_use]
    pub fn position(&self, pixel: (u32, u32)) -> Vec3 {
        self.pixels[self.index(pixel)].lock.read().position
    }

    #[must_use]
    pub fn normal(&self, pixel: (u32, u32)) -> Vec3 {
        self.pixels[self.index(pixel)].lock.read().normal
    }

    #[must_use]
    pub fn normal_g(&self, pixel: (u32, u32)) -> Vec3 {
        self.pixels[self.index(pixel)].lock.read().normal_g
    }

    #[must_use]
    pub fn tangent(&self, pixel: (u32, u32)) -> Vec3 {
        self.pixels[self.index(pixel)].lock.read().tangent
    }

    #[must_use]
    pub fn bitangent(&self, pixel: (u32, u32)) -> Vec3 {
        self.pixels[self.index(pixel)].lock.read().bitangent
    }

    #[must_use]
    pub fn view(&self, pixel: (u32, u32)) -> Vec3 {
        self.pixels[self.index(pixel)].lock.read().view
    }

    #[must_use]
    pub fn uvw(&self, pixel: (u32, u32)) -> Vec3 {
        self.pixels[self.index(pixel)].lock.read().uvw
    }

    #[must_use]
    pub fn time(&self, pixel: (u32, u32)) -> f32 {
        self.pixels[self.index(pixel)].lock.read().time
    }

    #[must_use]
    pub fn depth(&self, pixel: (u32, u32)) -> f32 {
        self.pixels[self.index(pixel)].lock.read().depth
    }

    #[must_use]
    pub fn material_id(&self, pixel: (u32, u32)) -> Option<MaterialId> {
        self.pixels[self.index(pixel)].lock.read().material_id
    }

    #[must_use]
    pub fn entity_id(&self, pixel: (u32, u32)) -> Option<EntityId> {
        self.pixels[self.index(pixel)].lock.read().entity_id
    }

    #[must_use]
    pub fn feedback(&self, pixel: (u32, u32)) -> Feedback {
        Feedback::from_bits_truncate(self.pixels[self.index(pixel)].feedback.load(Ordering::Relaxed) as u8)
    }

    #[must_use]
    pub fn is_pixel_finished(&self, pixel: (u32, u32)) -> bool {
        let n = self.sample_count(pixel);
        if n < self.min_samples {
            return false;
        }
        match self.target_quality {
            None => true,
            Some(target) => self.quality(pixel) <= target,
        }
    }

    #[must_use]
    pub fn finished_pixel_count(&self) -> u64 {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&p| self.is_pixel_finished(p))
            .count() as u64
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::{Derivative2, ShadingFlags};

    fn closure() -> ShadingContext {
        ShadingContext {
            p: Vec3::ZERO,
            dpdu: Vec3::X,
            dpdv: Vec3::Y,
            dpdx: Vec3::ZERO,
            dpdy: Vec3::ZERO,
            n: Vec3::Z,
            ng: Vec3::Z,
            nx: Vec3::X,
            ny: Vec3::Y,
            v: Vec3::Z,
            n_dot_v: 1.0,
            ng_dot_v: 1.0,
            uvw: Vec3::ZERO,
            duvw: Derivative2::default(),
            primitive_id: 0,
            entity_id: None,
            material_id: None,
            emission_id: None,
            flags: ShadingFlags::empty(),
            wavelengths: [550.0; 4],
            wavelength_index: 0,
            time: 0.0,
            depth: 0,
        }
    }

    #[test]
    fn constant_input_pushed_n_times_reproduces_itself() {
        let fb = OutputFramebuffer::new(1, 1, 1, None);
        let c = closure();
        for _ in 0..16 {
            fb.push((0, 0), SpectralBlob::splat(0.5), &c);
        }
        let s = fb.spectral((0, 0));
        assert!((s.average() - 0.5).abs() < 1e-5);
        assert_eq!(fb.sample_count((0, 0)), 16);
    }

    #[test]
    fn nan_sample_is_discarded_and_flagged() {
        let fb = OutputFramebuffer::new(1, 1, 1, None);
        let c = closure();
        fb.push((0, 0), SpectralBlob::from_array([f32::NAN, 0.0, 0.0, 0.0]), &c);
        assert_eq!(fb.sample_count((0, 0)), 0);
        assert!(fb.feedback((0, 0)).contains(Feedback::NAN));
    }

    #[test]
    fn pixel_finished_respects_min_samples_and_quality() {
        let fb = OutputFramebuffer::new(1, 1, 4, Some(0.001));
        let c = closure();
        for _ in 0..3 {
            fb.push((0, 0), SpectralBlob::splat(0.5), &c);
        }
        assert!(!fb.is_pixel_finished((0, 0)));
        for _ in 0..10 {
            fb.push((0, 0), SpectralBlob::splat(0.5), &c);
        }
        assert!(fb.is_pixel_finished((0, 0)));
    }
}
