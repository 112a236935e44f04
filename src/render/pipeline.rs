//! Stream pipeline (component H, §4.8), grounded on the original's
//! `StreamPipeline`: each worker owns one write/read ray buffer and one hit
//! buffer, sized by `max_parallel_rays`, and advances through fill → swap →
//! trace → sort in lockstep with its tile.
//!
//! Ray and hit *streams* are modeled as plain `Vec`s rather than a
//! dedicated SIMD-lane type (§9 "no fixed lane width requirement beyond
//! batched") — `max_parallel_rays` only bounds how many camera rays are
//! enqueued before a trace/sort round, not a hardware vector width.

use super::ray::Ray;
use super::tile::RenderTile;
use crate::sampler::Sampler;
use crate::scene::camera::RenderCamera;
use crate::scene::{SceneDatabase, SurfaceHit};
use glam::Vec2;
use std::sync::atomic::{AtomicBool, Ordering};

/// One traced ray paired with its (possibly absent) surface hit.
#[derive(Debug, Clone, Copy)]
pub struct HitRecord {
    pub ray: Ray,
    pub hit: Option<SurfaceHit>,
}

pub struct StreamPipeline {
    max_parallel_rays: usize,
    write_rays: Vec<Ray>,
    read_rays: Vec<Ray>,
    hits: Vec<HitRecord>,
    cursor_x: u32,
    cursor_y: u32,
}

impl StreamPipeline {
    #[must_use]
    pub fn new(max_parallel_rays: usize) -> Self {
        Self {
            max_parallel_rays,
            write_rays: Vec::with_capacity(max_parallel_rays),
            read_rays: Vec::with_capacity(max_parallel_rays),
            hits: Vec::with_capacity(max_parallel_rays),
            cursor_x: 0,
            cursor_y: 0,
        }
    }

    /// Resets all buffers and the pixel cursor to the start of a fresh
    /// tile. Called whenever a worker picks up a new tile.
    pub fn reset(&mut self) {
        self.write_rays.clear();
        self.read_rays.clear();
        self.hits.clear();
        self.cursor_x = 0;
        self.cursor_y = 0;
    }

    /// The pipeline has nothing left to do for this tile: every pixel has
    /// been enqueued for the current sample round and no hits remain to be
    /// consumed by the integrator.
    #[must_use]
    pub fn is_finished(&self, tile: &RenderTile) -> bool {
        self.cursor_y >= tile.height() && self.hits.is_empty() && self.read_rays.is_empty()
    }

    /// Queues one continuation ray for the next trace round (integrator
    /// feedback, §4.8 step 5a).
    pub fn enqueue_ray(&mut self, ray: Ray) {
        self.write_rays.push(ray);
    }

    fn enqueue_camera_ray(&mut self, camera: &RenderCamera, tile: &mut RenderTile, local_x: u32, local_y: u32, image_w: u32, image_h: u32) {
        let px = tile.sx() + local_x;
        let py = tile.sy() + local_y;
        let sample_index = tile.samples_rendered();

        let (ax, ay) = tile.aa_sampler.generate_2d(sample_index);
        let (lx, ly) = tile.lens_sampler.generate_2d(sample_index);
        let t = tile.time_sampler.generate_1d(sample_index);
        let spectral_u = tile.spectral_sampler.generate_1d(sample_index);

        let ndc = Vec2::new(
            (2.0 * (px as f32 + ax)) / image_w.max(1) as f32 - 1.0,
            1.0 - (2.0 * (py as f32 + ay)) / image_h.max(1) as f32,
        );
        let wavelengths = crate::spectral::sample_hero_wavelengths(spectral_u);
        let pixel_index = py * image_w + px;
        let ray = camera.construct_camera_ray(ndc, Vec2::new(lx, ly), pixel_index, wavelengths, t);
        self.write_rays.push(ray);
    }

    /// §4.8 step 1: fills `write` with camera rays for the tile's
    /// remaining pixels at the current sample round, stopping when the
    /// buffer is full, the tile is exhausted, or cancellation is observed.
    fn fill_with_camera_rays(&mut self, tile: &mut RenderTile, camera: &RenderCamera, image_w: u32, image_h: u32, stopping: &AtomicBool) {
        let height = tile.height();
        let width = tile.width();

        while self.cursor_y < height {
            if self.cursor_x >= width {
                self.cursor_x = 0;
            }
            while self.cursor_x < width {
                if self.write_rays.len() >= self.max_parallel_rays || stopping.load(Ordering::Relaxed) {
                    return;
                }
                self.enqueue_camera_ray(camera, tile, self.cursor_x, self.cursor_y, image_w, image_h);
                self.cursor_x += 1;
            }
            self.cursor_y += 1;
        }
    }

    /// §4.8 steps 1-4: fill, swap, trace, and (optionally) sort hits by
    /// material id for batched shading locality. Step 5 (feeding pairs to
    /// the integrator) is the caller's responsibility via [`Self::drain`]
    /// and [`Self::enqueue_ray`].
    #[allow(clippy::too_many_arguments)]
    pub fn run_iteration(
        &mut self,
        tile: &mut RenderTile,
        camera: &RenderCamera,
        image_w: u32,
        image_h: u32,
        scene: &SceneDatabase,
        sort_hits: bool,
        stopping: &AtomicBool,
    ) {
        self.fill_with_camera_rays(tile, camera, image_w, image_h, stopping);

        if stopping.load(Ordering::Relaxed) {
            return;
        }

        std::mem::swap(&mut self.write_rays, &mut self.read_rays);
        self.write_rays.clear();

        self.hits.clear();
        for ray in self.read_rays.drain(..) {
            let hit = scene.acceleration.as_ref().and_then(|accel| {
                accel.intersect(ray.origin.into(), ray.direction.into(), 1e-4, f32::INFINITY)
            });
            self.hits.push(HitRecord { ray, hit });
        }

        if stopping.load(Ordering::Relaxed) {
            return;
        }

        if sort_hits {
            self.hits.sort_by_key(|h| h.hit.map(|s| material_sort_key(scene, s)));
        }
    }

    /// Drains the current hit batch for the integrator to consume.
    pub fn drain(&mut self) -> std::vec::Drain<'_, HitRecord> {
        self.hits.drain(..)
    }

    /// Number of continuation rays an integrator has queued for the next
    /// trace round. Test-only introspection; production code drives the
    /// pipeline through `run_iteration`/`drain` instead.
    #[cfg(test)]
    pub(crate) fn queued_ray_count(&self) -> usize {
        self.write_rays.len()
    }
}

fn material_sort_key(scene: &SceneDatabase, hit: SurfaceHit) -> u32 {
    scene
        .entities
        .get(hit.entity)
        .and_then(|e| e.material)
        .map_or(u32::MAX, |m| m.data().as_ffi() as u32)
}
