//! Projection map (§4.10), grounded on the classic photon-mapping
//! "precomputed importance" optimization: rays fired from the camera
//! through specular chains mark which directions are worth biasing photon
//! emission toward, so caustic-focused scenes (§8 scenario 3, "specular
//! focus") don't waste most of a PPM pass's photons on paths the camera
//! can never see.
//!
//! Directions are binned into an equirectangular `resolution x resolution`
//! grid rather than an octahedral or cube-map layout — simpler to index,
//! and the grid is only ever queried with a importance weight, never
//! rasterized, so the distortion at the poles doesn't matter.

use crate::config::RenderSettings;
use crate::render::ray::Ray;
use crate::scene::SceneDatabase;
use crate::shading::Rnd3;
use glam::Vec3;
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicU32, Ordering};

/// Minimum acceptance probability any bin is ever assigned (§4.10
/// "`epsilon_floor = 0.01` ... no direction is ever assigned zero
/// probability"), so a light never goes fully dark just because a probe
/// never reached that bin.
const EPSILON_FLOOR: f32 = 0.01;

/// Recorded weight is fixed-point scaled by this factor so the per-bin
/// accumulator can stay a plain `AtomicU32` instead of needing an atomic
/// float; the scale cancels out in every ratio `importance` computes.
const WEIGHT_SCALE: f32 = 256.0;

pub struct ProjectionMap {
    resolution: u32,
    hits: Vec<AtomicU32>,
    total: AtomicU32,
}

impl ProjectionMap {
    #[must_use]
    pub fn new(resolution: u32) -> Self {
        let resolution = resolution.max(1);
        let mut hits = Vec::with_capacity((resolution * resolution) as usize);
        hits.resize_with((resolution * resolution) as usize, || AtomicU32::new(0));
        Self { resolution, hits, total: AtomicU32::new(0) }
    }

    fn cell_index(&self, direction: Vec3) -> usize {
        let d = direction.normalize_or_zero();
        let theta = d.y.clamp(-1.0, 1.0).acos();
        let phi = d.z.atan2(d.x) + PI;
        let u = ((phi / (2.0 * PI)) * self.resolution as f32) as u32 % self.resolution;
        let v = ((theta / PI) * self.resolution as f32) as u32;
        (v.min(self.resolution - 1) * self.resolution + u) as usize
    }

    /// Records a probe reaching `direction`, weighted by `weight` (§4.10
    /// `pdf · (1 + (bounces/max_depth)·caustic_preference)`, folded in by
    /// the caller before this is reached).
    pub fn record(&self, direction: Vec3, weight: f32) {
        let idx = self.cell_index(direction);
        let scaled = (weight * WEIGHT_SCALE).round().max(0.0) as u32;
        self.hits[idx].fetch_add(scaled, Ordering::Relaxed);
        self.total.fetch_add(scaled, Ordering::Relaxed);
    }

    /// Acceptance probability for emitting a photon toward `direction`: a
    /// floor of `EPSILON_FLOOR` plus a share of the remaining mass
    /// proportional to how often (and how caustic-preferred) a camera
    /// probe reached a specular-then-diffuse vertex along that direction.
    #[must_use]
    pub fn importance(&self, direction: Vec3) -> f32 {
        let total = self.total.load(Ordering::Relaxed).max(1) as f32;
        let observed = self.hits[self.cell_index(direction)].load(Ordering::Relaxed) as f32;
        EPSILON_FLOOR + (1.0 - EPSILON_FLOOR) * observed / total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total.load(Ordering::Relaxed) == 0
    }

    /// Fires `probe_count` rays from the camera, following purely
    /// specular bounces (mirror/glass: `pdf_solid_angle` reported as
    /// infinite) up to `max_diffuse_bounces`, and records the direction of
    /// every vertex each chain reaches, weighted toward vertices found
    /// deeper in a specular chain by `settings.ppm.caustic_preference`
    /// (§4.10).
    pub fn build(&self, scene: &SceneDatabase, settings: &RenderSettings, probe_count: u32, rng: &mut Xoshiro256PlusPlus) {
        let camera = scene.camera.extract_render_camera();
        let max_depth = settings.ppm.max_diffuse_bounces.max(1);
        for _ in 0..probe_count {
            let ndc = glam::Vec2::new(rng.random::<f32>() * 2.0 - 1.0, rng.random::<f32>() * 2.0 - 1.0);
            let mut ray = camera.construct_camera_ray(ndc, glam::Vec2::splat(0.5), 0, [550.0; 4], 0.0);

            for bounce in 0..max_depth {
                let Some(hit) = scene
                    .acceleration
                    .as_ref()
                    .and_then(|accel| accel.intersect(ray.origin.into(), ray.direction.into(), 1e-3, f32::INFINITY))
                else {
                    break;
                };
                let closure = super::shading_context_from_hit(&ray, &hit, scene);
                let weight = 1.0 + (bounce as f32 / max_depth as f32) * settings.ppm.caustic_preference;
                self.record(ray.direction, weight);

                let Some(material) = closure.material_id.and_then(|id| scene.material(id)) else {
                    break;
                };
                let rnd = Rnd3 { x: rng.random::<f32>(), y: rng.random::<f32>(), z: rng.random::<f32>() };
                let sample = material.sample(&closure, rnd, &scene.nodes);
                if !sample.is_specular() || sample.pdf_solid_angle <= 0.0 {
                    break;
                }
                ray = Ray::shadow_probe(closure.p, sample.l, ray.wavelengths, ray.time);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_map_is_empty_and_uniform() {
        let map = ProjectionMap::new(8);
        assert!(map.is_empty());
        let a = map.importance(Vec3::X);
        let b = map.importance(Vec3::NEG_X);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn recorded_direction_increases_its_own_importance() {
        let map = ProjectionMap::new(8);
        let baseline = map.importance(Vec3::Y);
        for _ in 0..100 {
            map.record(Vec3::Y, 1.0);
        }
        assert!(map.importance(Vec3::Y) > baseline);
    }

    #[test]
    fn importance_never_drops_below_the_epsilon_floor() {
        let map = ProjectionMap::new(8);
        map.record(Vec3::Y, 1.0);
        assert!(map.importance(Vec3::NEG_Y) >= EPSILON_FLOOR - 1e-6);
    }

    #[test]
    fn deeper_bounce_weight_outweighs_a_shallow_one() {
        let map = ProjectionMap::new(8);
        map.record(Vec3::X, 1.0);
        map.record(Vec3::NEG_X, 1.0 + 1.0 * 2.0);
        assert!(map.importance(Vec3::NEG_X) > map.importance(Vec3::X));
    }
}
