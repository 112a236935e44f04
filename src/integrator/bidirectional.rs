//! Bidirectional path tracing (§4.9 "Bidirectional"), grounded on the same
//! stream-pipeline/on_hit contract as [`super::direct::DirectIntegrator`].
//!
//! The camera subpath rides the batched pipeline exactly like direct
//! lighting's BSDF-sampling strategy; the light subpath is built eagerly,
//! in one bounded loop per camera hit, the same way next-event estimation
//! already steps outside the batched trace round via
//! [`crate::scene::Traceable::occluded`] (§9: explicit loops, not a
//! recursive walk). Every light vertex is connected to the current camera
//! vertex and the contributions combined with the balance heuristic
//! (§4.3), which degrades gracefully to plain next-event estimation when
//! `max_light_depth == 0` — the basis for the "bidirectional matches
//! direct on a single-bounce diffuse scene" property (§8).

use super::{background_shading_context, light_sample_context, pixel_xy, shading_context_from_hit, Integrator, IntegratorStatus};
use crate::config::RenderSettings;
use crate::math::mis::balance_weight;
use crate::math::projection::{cosine_hemisphere, to_world};
use crate::render::output::OutputFramebuffer;
use crate::render::pipeline::StreamPipeline;
use crate::render::ray::Ray;
use crate::scene::{SceneDatabase, SurfaceHit};
use crate::shading::{Rnd3, ShadingContext};
use crate::spectral::SpectralBlob;
use glam::Vec3;
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::atomic::{AtomicU32, Ordering};

struct LightVertex {
    point: Vec3,
    normal: Vec3,
    /// Accumulated throughput reaching this vertex, including the emitted
    /// radiance and every BSDF/pdf term along the way.
    beta: SpectralBlob,
    /// Solid-angle pdf of the light-subpath step that produced this
    /// vertex, used only to report the strategy count to the balance
    /// heuristic, not to re-derive `beta`.
    pdf_solid_angle: f32,
}

pub struct BidirectionalIntegrator {
    max_samples: AtomicU32,
}

impl Default for BidirectionalIntegrator {
    fn default() -> Self {
        Self { max_samples: AtomicU32::new(16) }
    }
}

impl BidirectionalIntegrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits from a uniformly chosen area light and random-walks the
    /// result up to `max_light_depth` diffuse bounces (§4.9 light
    /// subpath). Specular-only chains are not attempted: reflecting off a
    /// Dirac lobe would need an infinite pdf in `pdf_solid_angle`, which
    /// the balance heuristic below cannot combine with a finite camera
    /// pdf, so such vertices are simply dropped from the subpath.
    fn trace_light_subpath(
        &self,
        scene: &SceneDatabase,
        settings: &RenderSettings,
        rng: &mut Xoshiro256PlusPlus,
    ) -> Vec<LightVertex> {
        let emitters: Vec<_> = scene
            .entities
            .values()
            .filter(|e| e.light_sampler.is_some() && e.emission.is_some())
            .collect();
        if emitters.is_empty() {
            return Vec::new();
        }

        let pick = (rng.random::<f32>() * emitters.len() as f32) as usize;
        let entity = emitters[pick.min(emitters.len() - 1)];
        let sampler = entity.light_sampler.as_ref().unwrap();
        let Some(emission) = scene.emission(entity.emission.unwrap()) else {
            return Vec::new();
        };

        let area_sample = sampler.sample(rng.random::<f32>(), rng.random::<f32>());
        let pick_pdf = 1.0 / emitters.len() as f32;
        let area_pdf = area_sample.pdf_area * pick_pdf;
        if area_pdf <= 0.0 {
            return Vec::new();
        }

        let emit_closure = light_sample_context(area_sample.point, area_sample.normal, area_sample.normal, &Ray::shadow_probe(area_sample.point, area_sample.normal, [550.0; 4], 0.0));
        let le = emission.eval(&emit_closure, &scene.nodes);

        let local = cosine_hemisphere(rng.random::<f32>(), rng.random::<f32>());
        let dir = to_world(local.direction, area_sample.normal);
        let pdf_dir = local.pdf;
        if pdf_dir <= 0.0 {
            return Vec::new();
        }

        // Throughput of the emission vertex itself: `Le / pdf_area`, the
        // area-measure analogue of a camera ray's initial weight of 1.
        let mut beta = le * (1.0 / area_pdf);
        let mut vertices = vec![LightVertex { point: area_sample.point, normal: area_sample.normal, beta, pdf_solid_angle: area_pdf }];

        let mut origin = area_sample.point;
        let mut direction = dir;
        let mut pdf = pdf_dir;
        for _ in 0..settings.bidirectional.max_light_depth {
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

            // Extend throughput by the travelled segment's cosine/pdf term
            // before sampling the bounce.
            let cos_in = closure.n.dot(-direction).abs();
            beta = beta * (cos_in / pdf);
            vertices.push(LightVertex { point: closure.p, normal: closure.n, beta, pdf_solid_angle: pdf });

            let rnd = Rnd3 { x: rng.random::<f32>(), y: rng.random::<f32>(), z: rng.random::<f32>() };
            let sample = material.sample(&closure, rnd, &scene.nodes);
            if sample.pdf_solid_angle <= 0.0 || sample.is_specular() {
                break;
            }
            let n_dot_l = closure.n.dot(sample.l).abs();
            let bsdf_value = material.eval(&closure, sample.l, n_dot_l, &scene.nodes);
            beta = beta * bsdf_value * (n_dot_l / sample.pdf_solid_angle);
            pdf = sample.pdf_solid_angle;
            origin = closure.p;
            direction = sample.l;
        }

        vertices
    }

    fn connect(
        &self,
        closure: &ShadingContext,
        material: &dyn crate::shading::Material,
        vertices: &[LightVertex],
        scene: &SceneDatabase,
    ) -> SpectralBlob {
        let mut sum = SpectralBlob::ZERO;
        for vertex in vertices {
            let to_light = vertex.point - closure.p;
            let dist_sqr = to_light.length_squared();
            if dist_sqr < 1e-12 {
                continue;
            }
            let dist = dist_sqr.sqrt();
            let l = to_light / dist;
            let n_dot_l = closure.n.dot(l);
            let cos_at_light = vertex.normal.dot(-l);
            if n_dot_l <= 0.0 || cos_at_light <= 0.0 {
                continue;
            }

            let occluded = scene
                .acceleration
                .as_ref()
                .is_some_and(|accel| accel.occluded(closure.p.into(), l.into(), 1e-3, dist - 1e-3));
            if occluded {
                continue;
            }

            let bsdf_value = material.eval(closure, l, n_dot_l, &scene.nodes);
            let bsdf_pdf = material.pdf(closure, l, n_dot_l);
            let weight = balance_weight(vertex.pdf_solid_angle, bsdf_pdf.max(1e-6));
            let g = n_dot_l * cos_at_light / dist_sqr;
            sum += bsdf_value * vertex.beta * (weight * g);
        }
        sum
    }
}

impl Integrator for BidirectionalIntegrator {
    fn on_start(&mut self, _scene: &SceneDatabase, settings: &RenderSettings, _image_w: u32, _image_h: u32) {
        self.max_samples.store(settings.effective_max_samples(), Ordering::Relaxed);
    }

    fn on_next_pass(&mut self, _pass: u32, _scene: &SceneDatabase, _output: &OutputFramebuffer) -> bool {
        true
    }

    fn needs_next_pass(&self, pass: u32) -> bool {
        pass == 0
    }

    fn max_passes(&self) -> Option<u32> {
        Some(1)
    }

    fn max_samples(&self) -> u32 {
        self.max_samples.load(Ordering::Relaxed)
    }

    fn status(&self, pass: u32) -> IntegratorStatus {
        IntegratorStatus { pass, percentage: 0.0, message: "bidirectional path tracing".into() }
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
        let Some(hit) = hit else {
            let bg = background_shading_context(&ray);
            let mut radiance = SpectralBlob::ZERO;
            for (_, light) in &scene.infinite_lights {
                let weight = ray
                    .mis_bsdf_pdf
                    .map_or(1.0, |bsdf_pdf| balance_weight(bsdf_pdf, light.sampler.pdf(ray.direction)));
                radiance += light.sampler.radiance(ray.direction, ray.wavelengths) * weight;
            }
            output.push(pixel_xy(&ray, output), radiance * ray.weight, &bg);
            return;
        };

        let closure = shading_context_from_hit(&ray, &hit, scene);
        let mut radiance = SpectralBlob::ZERO;
        if let Some(emission_id) = closure.emission_id {
            // The t=0 strategy (emission seen at the eye-path tip) is added
            // unweighted (§4.9 point 4); it never competes against another
            // sampling strategy the way a next-event-estimation hit does.
            if let Some(emission) = scene.emission(emission_id) {
                radiance += emission.eval(&closure, &scene.nodes) * ray.weight;
            }
        }

        let Some(material) = closure.material_id.and_then(|id| scene.material(id)) else {
            output.push(pixel_xy(&ray, output), radiance, &closure);
            return;
        };

        if !closure.is_grazing() {
            let light_path = self.trace_light_subpath(scene, settings, rng);
            radiance += self.connect(&closure, material, &light_path, scene) * ray.weight;
        }

        output.push(pixel_xy(&ray, output), radiance, &closure);

        if ray.depth >= settings.bidirectional.max_camera_depth {
            return;
        }

        let rnd = Rnd3 { x: rng.random::<f32>(), y: rng.random::<f32>(), z: rng.random::<f32>() };
        let sample = material.sample(&closure, rnd, &scene.nodes);
        if sample.pdf_solid_angle <= 0.0 || sample.path_weight <= 0.0 {
            return;
        }
        let n_dot_l = closure.n.dot(sample.l).abs();
        let throughput = if sample.is_specular() {
            SpectralBlob::splat(sample.path_weight)
        } else {
            let bsdf_value = material.eval(&closure, sample.l, n_dot_l, &scene.nodes);
            bsdf_value * (n_dot_l / sample.pdf_solid_angle * sample.path_weight)
        };
        if throughput.sum() <= 0.0 {
            return;
        }

        let mut next = ray.next(closure.p, sample.l);
        next.weight *= throughput;
        if !sample.is_specular() {
            next.mis_bsdf_pdf = Some(sample.pdf_solid_angle);
        }
        pipeline.enqueue_ray(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scene_produces_no_light_subpath() {
        let scene = SceneDatabase::new(crate::scene::Camera::default());
        let settings = RenderSettings::default();
        let mut rng = super::super::thread_rng_from(0, 0);
        let integ = BidirectionalIntegrator::new();
        assert!(integ.trace_light_subpath(&scene, &settings, &mut rng).is_empty());
    }

    #[test]
    fn default_integrator_runs_a_single_pass() {
        let integ = BidirectionalIntegrator::new();
        assert_eq!(integ.max_passes(), Some(1));
    }
}
