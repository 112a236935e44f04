//! Stochastic progressive photon mapping (§4.9 "PPM"), grounded on the
//! original's `PPM` pass alternation and on
//! [`crate::photon::PhotonMap`]'s "lock-free during tracing, queried only
//! after a barrier" contract (§5, §9 "stochastic progressive PPM only, no
//! plain single-radius variant").
//!
//! Pass 0 drives the ordinary tile pipeline once, tracing each pixel's eye
//! path through any specular bounces and caching the first non-specular
//! vertex it reaches as that pixel's hit-point. Every pass after that is a
//! light-indexed photon-deposition pass or a per-hit-point gather-update
//! pass; neither touches the camera or the stream pipeline again. A gather
//! pass applies the Hachisuka-Jensen update directly to each cached
//! hit-point's `(r², N, Φ)` state and pushes the refined radiance estimate,
//! so a pixel's displayed value keeps converging for the rest of the render
//! without ever re-tracing its eye path.

use super::projection_map::ProjectionMap;
use super::{light_sample_context, pixel_xy, shading_context_from_hit, thread_rng_from, Integrator, IntegratorStatus};
use crate::config::RenderSettings;
use crate::math::projection::{cosine_hemisphere, to_world};
use crate::photon::{EncodedDirection, GatherMode, GatherQuery, Photon, PhotonFlags, PhotonMap};
use crate::render::output::OutputFramebuffer;
use crate::render::pipeline::StreamPipeline;
use crate::render::ray::Ray;
use crate::scene::{Camera, MaterialId, SceneDatabase, SurfaceHit};
use crate::shading::{Rnd3, ShadingContext};
use crate::spectral::SpectralBlob;
use parking_lot::RwLock;
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

const MAX_BOUNCE_SAFETY: u32 = 64;

/// A pixel's cached eye-path vertex and its running Hachisuka-Jensen state.
/// Built once at pass 0; every later gather pass only updates `r_sqr`,
/// `n_photons` and `phi` in place.
#[derive(Clone, Copy)]
struct HitPointState {
    closure: ShadingContext,
    material: MaterialId,
    /// Accumulated eye-path throughput up to this vertex (product of every
    /// specular bounce's `path_weight` before it; `SpectralBlob::splat(1.0)`
    /// for a primary hit). Spectral, not a single scalar (§3), so a
    /// colored specular chain (a tinted mirror, a dispersive glass bounce)
    /// keeps its per-wavelength shape into the gather estimate.
    throughput: SpectralBlob,
    r_sqr: f32,
    n_photons: f32,
    phi: SpectralBlob,
}

/// Everything a pixel carries across the whole render, not just one pass.
#[derive(Clone, Copy)]
struct PixelState {
    /// Radiance resolved without the photon map: emission seen directly or
    /// along a specular chain, plus whatever a ray that left the scene
    /// picked up from the infinite lights. Fixed after pass 0. Direct
    /// illumination at the cached hit-point is deliberately *not* added
    /// here — §4.9's final-value formula is `Φ/(π·r²·total)` alone, so the
    /// photon map's first-bounce deposits are the only source of direct
    /// light at a diffuse hit-point, same as the gather step's indirect.
    base: SpectralBlob,
    /// Last closure written for this pixel, kept only so the framebuffer's
    /// auxiliary channels (position/normal/etc.) have something to show.
    closure: ShadingContext,
    hit: Option<HitPointState>,
}

impl PixelState {
    fn neutral() -> Self {
        Self {
            base: SpectralBlob::ZERO,
            closure: super::background_shading_context(&Ray::primary(glam::Vec3::ZERO, glam::Vec3::Z, 0, [550.0; 4], 0.0)),
            hit: None,
        }
    }
}

pub struct PpmIntegrator {
    photon_map: RwLock<PhotonMap>,
    pixels: Vec<RwLock<PixelState>>,
    total_photons_emitted: AtomicU64,
    current_pass: AtomicU32,
    settings: RwLock<RenderSettings>,
    image_w: AtomicU32,
    image_h: AtomicU32,
    /// Built once on `on_start` when `settings.ppm.use_projection_map` is
    /// set; `None` otherwise (§4.10, an optional PPM auxiliary).
    projection_map: RwLock<Option<ProjectionMap>>,
}

impl Default for PpmIntegrator {
    fn default() -> Self {
        Self {
            photon_map: RwLock::new(PhotonMap::new(glam::Vec3::ZERO, 1.0)),
            pixels: Vec::new(),
            total_photons_emitted: AtomicU64::new(0),
            current_pass: AtomicU32::new(0),
            settings: RwLock::new(RenderSettings::default()),
            image_w: AtomicU32::new(0),
            image_h: AtomicU32::new(0),
            projection_map: RwLock::new(None),
        }
    }
}

impl PpmIntegrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn pixel_index(&self, px: u32, py: u32) -> usize {
        (py * self.image_w.load(Ordering::Relaxed) + px) as usize
    }

    fn accumulate_base(&self, idx: usize, radiance: SpectralBlob) {
        self.pixels[idx].write().base += radiance;
    }

    /// Writes the pass-0 terminal state for a pixel whose eye path never
    /// reached a non-specular vertex (background miss, no material, a
    /// grazing hit, or the depth budget ran out).
    fn finish_pixel(&self, idx: usize, px: u32, py: u32, closure: &ShadingContext, output: &OutputFramebuffer) {
        let estimate;
        let snapshot;
        {
            let mut state = self.pixels[idx].write();
            state.closure = *closure;
            estimate = state.base;
            snapshot = state.closure;
        }
        output.set_estimate((px, py), estimate, &snapshot);
    }

    /// Writes the pass-0 hit-point a pixel's eye path terminated on: the
    /// first non-specular vertex, cached for every later gather pass.
    fn store_hit_point(&self, idx: usize, px: u32, py: u32, closure: ShadingContext, material_id: MaterialId, throughput: SpectralBlob, output: &OutputFramebuffer) {
        let r0 = self.settings.read().ppm.initial_radius_sqr;

        let estimate;
        let snapshot;
        {
            let mut state = self.pixels[idx].write();
            state.closure = closure;
            state.hit = Some(HitPointState { closure, material: material_id, throughput, r_sqr: r0, n_photons: 0.0, phi: SpectralBlob::ZERO });
            estimate = state.base;
            snapshot = state.closure;
        }
        output.set_estimate((px, py), estimate, &snapshot);
    }

    /// Shoots `photons_per_pass` photons split evenly across every finite
    /// emitter (§4.9 "floor of `min_photons` per light"), storing one
    /// [`Photon`] at each diffuse vertex a walk reaches and continuing
    /// with Russian-roulette probability proportional to the BSDF's
    /// average throughput.
    fn shoot_photons(&self, scene: &SceneDatabase) {
        let settings = self.settings.read().clone();
        let emitters: Vec<_> = scene
            .entities
            .values()
            .filter(|e| e.light_sampler.is_some() && e.emission.is_some())
            .collect();
        if emitters.is_empty() {
            return;
        }

        let min_per_light = (settings.ppm.min_photons_fraction * settings.ppm.photons_per_pass as f32) as u32;
        let per_light = (settings.ppm.photons_per_pass / emitters.len() as u32).max(min_per_light.max(1));
        let mut rng = thread_rng_from(settings.seed, u64::from(self.current_pass.load(Ordering::Relaxed)));
        let mut emitted = 0u64;

        let photon_map = self.photon_map.read();
        let projection_map = self.projection_map.read();
        for entity in &emitters {
            let sampler = entity.light_sampler.as_ref().unwrap();
            let Some(emission) = scene.emission(entity.emission.unwrap()) else { continue };

            for _ in 0..per_light {
                emitted += 1;
                let area_sample = sampler.sample(rng.random::<f32>(), rng.random::<f32>());
                if area_sample.pdf_area <= 0.0 {
                    continue;
                }
                let emit_ray = Ray::shadow_probe(area_sample.point, area_sample.normal, [550.0; 4], 0.0);
                let emit_closure = light_sample_context(area_sample.point, area_sample.normal, area_sample.normal, &emit_ray);
                let le = emission.eval(&emit_closure, &scene.nodes);

                let local = cosine_hemisphere(rng.random::<f32>(), rng.random::<f32>());
                if local.pdf <= 0.0 {
                    continue;
                }
                let dir = to_world(local.direction, area_sample.normal);

                // Projection-map-guided thinning (§4.10): accept this
                // direction with probability `accept`, compensating by
                // dividing its power by the same probability so the
                // estimator stays unbiased while concentrating photons on
                // directions a camera probe actually reached.
                let mut accept = 1.0f32;
                if let Some(pm) = projection_map.as_ref() {
                    if !pm.is_empty() {
                        accept = pm.importance(dir);
                        if rng.random::<f32>() > accept {
                            continue;
                        }
                    }
                }

                // cos_theta/pdf_dir == pi for cosine-weighted hemisphere sampling.
                let mut power = le * (PI / area_sample.pdf_area / per_light as f32 / accept);

                let mut origin = area_sample.point;
                let mut direction = dir;
                for bounce in 0..MAX_BOUNCE_SAFETY.min(settings.ppm.max_diffuse_bounces * 4) {
                    let Some(hit) = scene
                        .acceleration
                        .as_ref()
                        .and_then(|accel| accel.intersect(origin.into(), direction.into(), 1e-3, f32::INFINITY))
                    else {
                        break;
                    };
                    let ray = Ray::shadow_probe(origin, direction, [550.0; 4], 0.0);
                    let closure = shading_context_from_hit(&ray, &hit, scene);
                    let Some(material) = closure.material_id.and_then(|id| scene.material(id)) else {
                        break;
                    };

                    let rnd = Rnd3 { x: rng.random::<f32>(), y: rng.random::<f32>(), z: rng.random::<f32>() };
                    let sample = material.sample(&closure, rnd, &scene.nodes);
                    if sample.pdf_solid_angle <= 0.0 {
                        break;
                    }

                    if !sample.is_specular() {
                        photon_map.store(Photon {
                            position: closure.p,
                            direction: EncodedDirection::encode(-direction),
                            power,
                            flags: PhotonFlags { bounce_depth: bounce.min(u32::from(u8::MAX)) as u8, reserved: 0 },
                        });
                    }

                    let n_dot_l = closure.n.dot(sample.l).abs();
                    let continuation = if sample.is_specular() {
                        power * sample.path_weight
                    } else {
                        let bsdf_value = material.eval(&closure, sample.l, n_dot_l, &scene.nodes);
                        power * bsdf_value * (n_dot_l / sample.pdf_solid_angle) * sample.path_weight
                    };

                    let survive = continuation.average().min(1.0);
                    if rng.random::<f32>() > survive || survive <= 0.0 {
                        break;
                    }
                    power = continuation * (1.0 / survive);
                    origin = closure.p;
                    direction = sample.l;
                }
            }
        }

        self.total_photons_emitted.fetch_add(emitted.max(1), Ordering::Relaxed);
    }

    /// Applies one Hachisuka-Jensen update round to every cached hit-point
    /// and pushes the refined estimate. Pixels with no cached hit-point
    /// (a miss, or a path that never found a diffuse vertex) simply
    /// re-report their fixed `base` value, keeping every pixel's
    /// `sample_count` advancing in lockstep (§5).
    fn gather_update(&mut self, scene: &SceneDatabase, output: &OutputFramebuffer) {
        let settings = self.settings.get_mut().clone();
        let total_emitted = self.total_photons_emitted.load(Ordering::Relaxed).max(1) as f32;
        let alpha = 1.0 - settings.ppm.contract_ratio;
        let squeeze_weight = settings.ppm.squeeze_weight;
        let cone_k = settings.ppm.cone_k;
        let image_w = self.image_w.load(Ordering::Relaxed);
        let photon_map: &PhotonMap = &*self.photon_map.get_mut();
        let pixels = &self.pixels;

        pixels.par_iter().enumerate().for_each(|(idx, slot)| {
            let px = idx as u32 % image_w.max(1);
            let py = idx as u32 / image_w.max(1);

            let Some(mut hit) = slot.read().hit else {
                let (estimate, closure) = {
                    let state = slot.read();
                    (state.base, state.closure)
                };
                output.set_estimate((px, py), estimate, &closure);
                return;
            };
            let Some(material) = scene.material(hit.material) else { return };

            let query = GatherQuery { center: hit.closure.p, radius_sqr: hit.r_sqr, normal: hit.closure.n, squeeze_weight, mode: GatherMode::Dome, cone_k };
            let (flux, accepted) = photon_map.gather(&query, |photon, weight| {
                let wi = photon.direction.decode();
                let n_dot_l = hit.closure.n.dot(wi).max(0.0);
                material.eval(&hit.closure, wi, n_dot_l, &scene.nodes) * photon.power * weight
            });

            // Hachisuka-Jensen SPPM radius/flux update (§4.9).
            let m = accepted as f32;
            let n_new = hit.n_photons + (alpha * m).ceil();
            let ratio = if hit.n_photons + m > 0.0 { n_new / (hit.n_photons + m) } else { 1.0 };
            hit.phi = (hit.phi + flux) * ratio;
            hit.r_sqr *= ratio;
            hit.n_photons = n_new;

            let estimate;
            let closure;
            {
                let mut state = slot.write();
                state.hit = Some(hit);
                let indirect = hit.phi * (1.0 / (PI * hit.r_sqr.max(1e-12) * total_emitted)) * hit.throughput;
                estimate = state.base + indirect;
                closure = state.closure;
            }
            output.set_estimate((px, py), estimate, &closure);
        });
    }
}

impl Integrator for PpmIntegrator {
    fn on_start(&mut self, scene: &SceneDatabase, settings: &RenderSettings, image_w: u32, image_h: u32) {
        *self.settings.get_mut() = settings.clone();
        self.image_w.store(image_w, Ordering::Relaxed);
        self.image_h.store(image_h, Ordering::Relaxed);
        let origin = scene.camera.extract_render_camera().position;
        let delta = (settings.ppm.initial_radius_sqr.sqrt() * 2.0).max(1e-3);
        *self.photon_map.get_mut() = PhotonMap::new(origin, delta);
        self.total_photons_emitted.store(0, Ordering::Relaxed);
        self.pixels = (0..(image_w as usize * image_h as usize)).map(|_| RwLock::new(PixelState::neutral())).collect();

        *self.projection_map.get_mut() = if settings.ppm.use_projection_map {
            let map = ProjectionMap::new(settings.ppm.projection_map_resolution);
            let probe_count = settings.ppm.photons_per_pass.clamp(256, 32_000) / 4;
            let mut rng = thread_rng_from(settings.seed, u64::MAX);
            map.build(scene, settings, probe_count, &mut rng);
            Some(map)
        } else {
            None
        };
    }

    fn on_next_pass(&mut self, pass: u32, scene: &SceneDatabase, output: &OutputFramebuffer) -> bool {
        self.current_pass.store(pass, Ordering::Relaxed);
        if pass == 0 {
            return true;
        }
        let round = pass - 1;
        if round % 2 == 0 {
            self.photon_map.get_mut().reset();
            self.shoot_photons(scene);
        } else {
            self.gather_update(scene, output);
        }
        false
    }

    fn needs_next_pass(&self, pass: u32) -> bool {
        pass < 1 + self.settings.read().ppm.pass_count * 2
    }

    fn max_passes(&self) -> Option<u32> {
        Some(1 + self.settings.read().ppm.pass_count * 2)
    }

    fn max_samples(&self) -> u32 {
        1
    }

    fn status(&self, pass: u32) -> IntegratorStatus {
        let total = 1 + self.settings.read().ppm.pass_count * 2;
        let message = if pass == 0 {
            "hit-point pass"
        } else if (pass - 1) % 2 == 0 {
            "photon pass"
        } else {
            "gather pass"
        };
        IntegratorStatus { pass, percentage: f32::from(u16::try_from(pass).unwrap_or(u16::MAX)) / total.max(1) as f32, message: message.into() }
    }

    fn on_hit(
        &self,
        ray: Ray,
        hit: Option<SurfaceHit>,
        scene: &SceneDatabase,
        settings: &RenderSettings,
        output: &OutputFramebuffer,
        rng: &mut Xoshiro256PlusPlus,
        pipeline: &mut StreamPipeline,
    ) {
        let (px, py) = pixel_xy(&ray, output);
        let idx = self.pixel_index(px, py);

        let Some(hit) = hit else {
            let bg = super::background_shading_context(&ray);
            let mut radiance = SpectralBlob::ZERO;
            for (_, light) in &scene.infinite_lights {
                radiance += light.sampler.radiance(ray.direction, ray.wavelengths);
            }
            self.accumulate_base(idx, radiance * ray.weight);
            self.finish_pixel(idx, px, py, &bg, output);
            return;
        };

        let closure = shading_context_from_hit(&ray, &hit, scene);
        let mut radiance = SpectralBlob::ZERO;
        if let Some(emission_id) = closure.emission_id {
            if let Some(emission) = scene.emission(emission_id) {
                radiance += emission.eval(&closure, &scene.nodes) * ray.weight;
            }
        }
        self.accumulate_base(idx, radiance);

        let Some(material_id) = closure.material_id else {
            self.finish_pixel(idx, px, py, &closure, output);
            return;
        };
        let Some(material) = scene.material(material_id) else {
            self.finish_pixel(idx, px, py, &closure, output);
            return;
        };

        if closure.is_grazing() || ray.depth >= settings.max_ray_depth {
            self.finish_pixel(idx, px, py, &closure, output);
            return;
        }

        let rnd = Rnd3 { x: rng.random::<f32>(), y: rng.random::<f32>(), z: rng.random::<f32>() };
        let sample = material.sample(&closure, rnd, &scene.nodes);
        if sample.pdf_solid_angle <= 0.0 {
            self.finish_pixel(idx, px, py, &closure, output);
            return;
        }

        if sample.is_specular() {
            let mut next = ray.next(closure.p, sample.l);
            next.weight *= sample.path_weight;
            pipeline.enqueue_ray(next);
            return;
        }

        // First non-specular vertex: this is the pixel's cached hit-point.
        self.store_hit_point(idx, px, py, closure, material_id, ray.weight, output);
    }
}
