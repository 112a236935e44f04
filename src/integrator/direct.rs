//! Direct lighting integrator (§4.9 "Direct").
//!
//! One BSDF sample and one area/infinite-light sample per light, combined
//! under the power heuristic (§4.3). The BSDF-sampling strategy continues
//! as a single additional bounce by re-entering the stream pipeline rather
//! than recursing (§9); next-event estimation against every light is
//! resolved synchronously through [`Traceable::occluded`] since it doesn't
//! need another batched trace round.

use super::{background_shading_context, light_sample_context, pixel_xy, shading_context_from_hit, Integrator, IntegratorStatus};
use crate::config::RenderSettings;
use crate::math::mis::{power_weight, to_solid_angle};
use crate::render::output::OutputFramebuffer;
use crate::render::pipeline::StreamPipeline;
use crate::render::ray::Ray;
use crate::scene::{SceneDatabase, SurfaceHit};
use crate::shading::{Material, Rnd3, ShadingContext};
use crate::spectral::SpectralBlob;
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::atomic::{AtomicU32, Ordering};

pub struct DirectIntegrator {
    max_samples: AtomicU32,
}

impl Default for DirectIntegrator {
    fn default() -> Self {
        Self { max_samples: AtomicU32::new(16) }
    }
}

impl DirectIntegrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next-event estimation against every finite and infinite light,
    /// MIS-weighted against the BSDF's own pdf for the same direction
    /// (§4.9 "area-sample N_light times").
    #[allow(clippy::too_many_arguments)]
    fn sample_lights(
        &self,
        closure: &ShadingContext,
        ray: &Ray,
        material: &dyn Material,
        scene: &SceneDatabase,
        settings: &RenderSettings,
        rng: &mut Xoshiro256PlusPlus,
    ) -> SpectralBlob {
        let mut sum = SpectralBlob::ZERO;
        let n_light = settings.direct.light_samples.max(1);
        let beta = settings.direct.mis_power_beta;

        for (_, entity) in &scene.entities {
            let Some(sampler) = entity.light_sampler.as_ref() else { continue };
            let Some(emission_id) = entity.emission else { continue };
            let Some(emission) = scene.emission(emission_id) else { continue };

            for _ in 0..n_light {
                let sample = sampler.sample(rng.random::<f32>(), rng.random::<f32>());
                let to_light = sample.point - closure.p;
                let dist_sqr = to_light.length_squared();
                if dist_sqr < 1e-12 {
                    continue;
                }
                let dist = dist_sqr.sqrt();
                let l = to_light / dist;
                let n_dot_l = closure.n.dot(l);
                if n_dot_l <= 0.0 {
                    continue;
                }
                let cos_at_light = sample.normal.dot(-l);
                if cos_at_light <= 0.0 {
                    continue;
                }

                let occluded = scene
                    .acceleration
                    .as_ref()
                    .is_some_and(|accel| accel.occluded(closure.p.into(), l.into(), 1e-3, dist - 1e-3));
                if occluded {
                    continue;
                }

                let pdf_area = sample.pdf_area / n_light as f32;
                let light_pdf = to_solid_angle(pdf_area, dist_sqr, cos_at_light);
                if light_pdf <= 0.0 {
                    continue;
                }

                let bsdf_value = material.eval(closure, l, n_dot_l, &scene.nodes);
                let bsdf_pdf = material.pdf(closure, l, n_dot_l);
                let weight = power_weight(light_pdf, bsdf_pdf, beta);

                let light_closure = light_sample_context(sample.point, sample.normal, -l, ray);
                let le = emission.eval(&light_closure, &scene.nodes);

                sum += bsdf_value * le * (weight * n_dot_l / light_pdf);
            }
        }

        for (_, light) in &scene.infinite_lights {
            for _ in 0..n_light {
                let sample = light.sampler.sample(rng.random::<f32>(), rng.random::<f32>());
                let n_dot_l = closure.n.dot(sample.direction);
                if n_dot_l <= 0.0 || sample.pdf_solid_angle <= 0.0 {
                    continue;
                }
                let occluded = scene.acceleration.as_ref().is_some_and(|accel| {
                    accel.occluded(closure.p.into(), sample.direction.into(), 1e-3, f32::INFINITY)
                });
                if occluded {
                    continue;
                }
                let pdf = sample.pdf_solid_angle / n_light as f32;
                let bsdf_value = material.eval(closure, sample.direction, n_dot_l, &scene.nodes);
                let bsdf_pdf = material.pdf(closure, sample.direction, n_dot_l);
                let weight = power_weight(pdf, bsdf_pdf, beta);
                let le = light.sampler.radiance(sample.direction, ray.wavelengths);
                sum += bsdf_value * le * (weight * n_dot_l / pdf);
            }
        }

        sum
    }
}

impl Integrator for DirectIntegrator {
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
        IntegratorStatus { pass, percentage: 0.0, message: "direct lighting".into() }
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
        let beta = settings.direct.mis_power_beta;

        let Some(hit) = hit else {
            if ray.weight.sum() > 0.0 {
                let bg = background_shading_context(&ray);
                let mut radiance = SpectralBlob::ZERO;
                for (_, light) in &scene.infinite_lights {
                    let weight = ray.mis_bsdf_pdf.map_or(1.0, |bsdf_pdf| {
                        power_weight(bsdf_pdf, light.sampler.pdf(ray.direction), beta)
                    });
                    radiance += light.sampler.radiance(ray.direction, ray.wavelengths) * weight;
                }
                output.push(pixel_xy(&ray, output), radiance * ray.weight, &bg);
            }
            return;
        };

        let closure = shading_context_from_hit(&ray, &hit, scene);

        let mut radiance = SpectralBlob::ZERO;
        if let Some(emission_id) = closure.emission_id {
            if let Some(emission) = scene.emission(emission_id) {
                let weight = match ray.mis_bsdf_pdf {
                    None => 1.0,
                    Some(bsdf_pdf) => closure
                        .entity_id
                        .and_then(|id| scene.entities.get(id))
                        .and_then(|e| e.light_sampler.as_ref())
                        .map_or(1.0, |sampler| {
                            let cos_at_light = closure.ng.dot(-ray.direction).max(0.0);
                            let dist_sqr = hit.distance * hit.distance;
                            let pdf_area = 1.0 / sampler.surface_area();
                            let light_pdf = to_solid_angle(pdf_area, dist_sqr.max(1e-12), cos_at_light);
                            power_weight(bsdf_pdf, light_pdf, beta)
                        }),
                };
                radiance += emission.eval(&closure, &scene.nodes) * ray.weight * weight;
            }
        }

        let Some(material) = closure.material_id.and_then(|id| scene.material(id)) else {
            output.push(pixel_xy(&ray, output), radiance, &closure);
            return;
        };

        if closure.is_grazing() {
            output.push(pixel_xy(&ray, output), radiance, &closure);
            return;
        }

        radiance += self.sample_lights(&closure, &ray, material, scene, settings, rng) * ray.weight;
        output.push(pixel_xy(&ray, output), radiance, &closure);

        if ray.depth >= settings.max_ray_depth {
            return;
        }

        // §4.9 "hemisphere-sample the BSDF N_aa times": N_aa independent
        // continuation rays, each carrying 1/N_aa of the throughput, so
        // their sum stays an unbiased estimate of the single-sample case
        // while averaging down its variance.
        let n_aa = settings.direct.bsdf_samples.max(1);
        for _ in 0..n_aa {
            let rnd = Rnd3 { x: rng.random::<f32>(), y: rng.random::<f32>(), z: rng.random::<f32>() };
            let material_sample = material.sample(&closure, rnd, &scene.nodes);
            if material_sample.pdf_solid_angle <= 0.0 || material_sample.path_weight <= 0.0 {
                continue;
            }
            let n_dot_l = closure.n.dot(material_sample.l).abs();
            let throughput = if material_sample.is_specular() {
                SpectralBlob::splat(material_sample.path_weight)
            } else {
                let bsdf_value = material.eval(&closure, material_sample.l, n_dot_l, &scene.nodes);
                bsdf_value * (n_dot_l / material_sample.pdf_solid_angle * material_sample.path_weight)
            };
            if throughput.sum() <= 0.0 {
                continue;
            }

            let mut next = ray.next(closure.p, material_sample.l);
            next.weight *= throughput / n_aa as f32;
            if !material_sample.is_specular() {
                next.mis_bsdf_pdf = Some(material_sample.pdf_solid_angle);
            }
            pipeline.enqueue_ray(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntegratorKind;

    #[test]
    fn default_integrator_runs_a_single_pass() {
        let integ = DirectIntegrator::new();
        assert_eq!(integ.max_passes(), Some(1));
        assert!(integ.needs_next_pass(0));
        assert!(!integ.needs_next_pass(1));
    }

    #[test]
    fn on_start_adopts_settings_sample_budget() {
        let mut integ = DirectIntegrator::new();
        let scene = SceneDatabase::new(crate::scene::Camera::default());
        let settings = RenderSettings::default().with_integrator(IntegratorKind::Direct);
        integ.on_start(&scene, &settings, 4, 4);
        assert_eq!(integ.max_samples(), settings.samples_per_pixel);
    }

    fn diffuse_scene() -> (SceneDatabase, crate::scene::EntityId) {
        use crate::scene::{Entity, Mesh};
        use crate::shading::{DiffuseMaterial, ShadingNode};
        use crate::spectral::SpectralBlob;

        let mut scene = SceneDatabase::new(crate::scene::Camera::default());
        let node = scene.nodes.insert(ShadingNode::ConstSpectral(SpectralBlob::splat(0.8)));
        let material = scene.insert_material(Box::new(DiffuseMaterial::new(Some(node))));
        let mesh = scene.meshes.insert(Mesh { name: "quad".into(), triangle_count: 0 });
        let entity = scene.insert_entity(Entity { mesh, material: Some(material), emission: None, light_sampler: None, name: "quad".into() });
        scene.freeze();
        (scene, entity)
    }

    fn flat_hit(entity: crate::scene::EntityId) -> SurfaceHit {
        SurfaceHit {
            distance: 1.0,
            entity,
            primitive_id: 0,
            normal: [0.0, 0.0, 1.0],
            geometric_normal: [0.0, 0.0, 1.0],
            tangent: [0.0, 0.0, 0.0],
            bitangent: [0.0, 0.0, 0.0],
            uvw: [0.0, 0.0, 0.0],
        }
    }

    /// §9 edge case "NdotV = 0 grazing": a ray skimming the surface along
    /// its tangent plane must not propagate NaNs or spawn a bounce.
    #[test]
    fn grazing_incidence_shades_without_spawning_a_bounce() {
        let (scene, entity) = diffuse_scene();
        let settings = RenderSettings::default();
        let output = OutputFramebuffer::new(1, 1, 1, None);
        let mut rng = crate::integrator::thread_rng_from(0, 0);
        let mut pipeline = StreamPipeline::new(16);

        let ray = Ray::primary(glam::Vec3::new(0.0, 0.0, -1.0), glam::Vec3::X, 0, [550.0; 4], 0.0);
        let integ = DirectIntegrator::new();
        integ.on_hit(ray, Some(flat_hit(entity)), &scene, &settings, &output, &mut rng, &mut pipeline);

        assert_eq!(output.sample_count((0, 0)), 1);
        assert!(output.feedback((0, 0)).is_empty());
        assert_eq!(pipeline.queued_ray_count(), 0);
    }

    /// §9 edge case "max_ray_depth = 0": direct lighting still shades the
    /// hit but the path must terminate without a continuation ray.
    #[test]
    fn zero_max_ray_depth_shades_but_does_not_continue() {
        let (scene, entity) = diffuse_scene();
        let mut settings = RenderSettings::default();
        settings.max_ray_depth = 0;
        let output = OutputFramebuffer::new(1, 1, 1, None);
        let mut rng = crate::integrator::thread_rng_from(0, 0);
        let mut pipeline = StreamPipeline::new(16);

        let ray = Ray::primary(glam::Vec3::new(0.0, 0.0, 1.0), glam::Vec3::new(0.0, 0.0, -1.0), 0, [550.0; 4], 0.0);
        let integ = DirectIntegrator::new();
        integ.on_hit(ray, Some(flat_hit(entity)), &scene, &settings, &output, &mut rng, &mut pipeline);

        assert_eq!(output.sample_count((0, 0)), 1);
        assert!(output.feedback((0, 0)).is_empty());
        assert_eq!(pipeline.queued_ray_count(), 0);
    }
}
