//! Integrator framework (component I, §4.9).
//!
//! An [`Integrator`] does not recurse into the scene itself (§9 "integrators
//! are explicit loops over ray generations, not a recursive `applyRay`"): it
//! receives one traced [`Ray`]/[`SurfaceHit`] pair at a time from the
//! [`StreamPipeline`](crate::render::StreamPipeline) and, if the path should
//! continue, pushes a continuation ray back into the same pipeline for the
//! next trace round. Depth bookkeeping lives entirely on [`Ray::depth`].

pub mod bidirectional;
pub mod direct;
pub mod ppm;
pub mod projection_map;

pub use bidirectional::BidirectionalIntegrator;
pub use direct::DirectIntegrator;
pub use ppm::PpmIntegrator;

use crate::config::RenderSettings;
use crate::math::onb_from_normal;
use crate::render::output::OutputFramebuffer;
use crate::render::pipeline::StreamPipeline;
use crate::render::ray::Ray;
use crate::scene::{SceneDatabase, SurfaceHit};
use crate::shading::{ShadingContext, ShadingFlags};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Progress snapshot for a single pass (§4.9 "status reporting"; mirrors
/// [`crate::render::RenderStatus`] but scoped to the integrator's own
/// concept of a pass, e.g. PPM's photon/gather alternation).
#[derive(Debug, Clone)]
pub struct IntegratorStatus {
    pub pass: u32,
    pub percentage: f32,
    pub message: String,
}

/// The contract every light-transport algorithm implements. `on_start` and
/// `on_end` bracket the whole render; `on_next_pass` is called by the render
/// context between full image passes (used by PPM's photon/gather
/// alternation, a no-op for direct/bidirectional's single pass).
pub trait Integrator: Send + Sync {
    /// `image_w`/`image_h` are given so integrators that need a per-pixel
    /// cache across passes (PPM's hit-points) can size it up front; direct
    /// and bidirectional ignore them.
    fn on_start(&mut self, scene: &SceneDatabase, settings: &RenderSettings, image_w: u32, image_h: u32);

    /// Prepares pass `pass` (0-indexed) and returns whether the render
    /// context should drive the tile/stream-pipeline loop (calling
    /// `on_hit` once per traced camera ray) for this pass. `false` means
    /// the pass was already fully executed inside this call — PPM's
    /// photon-deposition and gather-update passes don't trace fresh camera
    /// rays at all, so they have no use for the pixel-indexed pipeline, but
    /// still need `output` to push their own per-pixel estimates.
    fn on_next_pass(&mut self, pass: u32, scene: &SceneDatabase, output: &OutputFramebuffer) -> bool;

    fn needs_next_pass(&self, pass: u32) -> bool;

    /// `None` means the integrator runs until the adaptive/sample-count stop
    /// condition fires rather than a fixed pass budget.
    fn max_passes(&self) -> Option<u32>;

    fn max_samples(&self) -> u32;

    fn on_end(&mut self) {}

    fn status(&self, pass: u32) -> IntegratorStatus {
        IntegratorStatus { pass, percentage: 0.0, message: String::new() }
    }

    /// Consumes one traced ray/hit pair. May push zero or more continuation
    /// rays into `pipeline` (bounce continuation, shadow probes already
    /// resolved via `scene.acceleration` directly do not need to) and may
    /// call `output.push` zero or more times.
    #[allow(clippy::too_many_arguments)]
    fn on_hit(
        &self,
        ray: Ray,
        hit: Option<SurfaceHit>,
        scene: &SceneDatabase,
        settings: &RenderSettings,
        output: &OutputFramebuffer,
        rng: &mut Xoshiro256PlusPlus,
        pipeline: &mut StreamPipeline,
    );
}

/// Seeds a per-worker RNG from the render seed and a disambiguating stream
/// id (tile index), matching the tile-local reseeding the samplers already
/// do (§5 "every worker thread owns its RNG state").
#[must_use]
pub fn thread_rng_from(seed: u64, stream: u64) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Builds the [`ShadingContext`] a material/emission evaluates against from
/// a traced ray and its hit record (§4.8 "populates the hit stream", §4.4).
/// Ray differentials are out of scope, so `dpdx`/`dpdy` stay zero.
#[must_use]
pub fn shading_context_from_hit(ray: &Ray, hit: &SurfaceHit, scene: &SceneDatabase) -> ShadingContext {
    let p = ray.at(hit.distance);
    let n = glam::Vec3::from(hit.normal);
    let ng = glam::Vec3::from(hit.geometric_normal);
    let v = -ray.direction;
    let n_dot_v = n.dot(v);
    let ng_dot_v = ng.dot(v);

    let (tangent, bitangent) = {
        let t = glam::Vec3::from(hit.tangent);
        let b = glam::Vec3::from(hit.bitangent);
        if t.length_squared() < 1e-12 || b.length_squared() < 1e-12 {
            onb_from_normal(n)
        } else {
            (t.normalize(), b.normalize())
        }
    };

    let (material_id, emission_id) = scene
        .entities
        .get(hit.entity)
        .map_or((None, None), |e| (e.material, e.emission));

    let mut flags = ShadingFlags::empty();
    if n_dot_v < 0.0 {
        flags |= ShadingFlags::INSIDE;
    }

    ShadingContext {
        p,
        dpdu: tangent,
        dpdv: bitangent,
        dpdx: glam::Vec3::ZERO,
        dpdy: glam::Vec3::ZERO,
        n,
        ng,
        nx: tangent,
        ny: bitangent,
        v,
        n_dot_v,
        ng_dot_v,
        uvw: glam::Vec3::from(hit.uvw),
        duvw: crate::shading::Derivative2::default(),
        primitive_id: hit.primitive_id,
        entity_id: Some(hit.entity),
        material_id,
        emission_id,
        flags,
        wavelengths: ray.wavelengths,
        wavelength_index: 0,
        time: ray.time,
        depth: ray.depth,
    }
}

/// Decodes a ray's flat pixel index back into `(x, y)` against the
/// framebuffer it will be written to.
#[must_use]
pub fn pixel_xy(ray: &Ray, output: &OutputFramebuffer) -> (u32, u32) {
    let w = output.width().max(1);
    (ray.pixel % w, ray.pixel / w)
}

/// A placeholder closure for a ray that left the scene without hitting
/// anything, built only so [`OutputFramebuffer::push`]'s auxiliary channels
/// have something to lerp against (§4.7: position/normal stay at whatever
/// the last miss wrote, since there is no surface).
#[must_use]
pub fn background_shading_context(ray: &Ray) -> ShadingContext {
    let v = -ray.direction;
    ShadingContext {
        p: ray.origin,
        dpdu: glam::Vec3::ZERO,
        dpdv: glam::Vec3::ZERO,
        dpdx: glam::Vec3::ZERO,
        dpdy: glam::Vec3::ZERO,
        n: v,
        ng: v,
        nx: glam::Vec3::ZERO,
        ny: glam::Vec3::ZERO,
        v,
        n_dot_v: 1.0,
        ng_dot_v: 1.0,
        uvw: glam::Vec3::ZERO,
        duvw: crate::shading::Derivative2::default(),
        primitive_id: u32::MAX,
        entity_id: None,
        material_id: None,
        emission_id: None,
        flags: ShadingFlags::empty(),
        wavelengths: ray.wavelengths,
        wavelength_index: 0,
        time: ray.time,
        depth: ray.depth,
    }
}

/// Builds the shading context a light's own emission evaluates against,
/// as seen from the receiving surface point (§4.9 "area-sample N_light
/// times" needs `Emission::eval` at the sampled point, not the receiver's).
#[must_use]
pub fn light_sample_context(sample_point: glam::Vec3, sample_normal: glam::Vec3, to_receiver: glam::Vec3, ray: &Ray) -> ShadingContext {
    let (nx, ny) = onb_from_normal(sample_normal);
    ShadingContext {
        p: sample_point,
        dpdu: nx,
        dpdv: ny,
        dpdx: glam::Vec3::ZERO,
        dpdy: glam::Vec3::ZERO,
        n: sample_normal,
        ng: sample_normal,
        nx,
        ny,
        v: to_receiver,
        n_dot_v: sample_normal.dot(to_receiver),
        ng_dot_v: sample_normal.dot(to_receiver),
        uvw: glam::Vec3::ZERO,
        duvw: crate::shading::Derivative2::default(),
        primitive_id: u32::MAX,
        entity_id: None,
        material_id: None,
        emission_id: None,
        flags: ShadingFlags::empty(),
        wavelengths: ray.wavelengths,
        wavelength_index: 0,
        time: ray.time,
        depth: ray.depth,
    }
}
