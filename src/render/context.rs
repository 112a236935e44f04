//! Render context (component J), grounded on the original's top-level
//! render loop: a fixed-size worker pool repeatedly claims a free tile from
//! the [`TileMap`], drives a [`StreamPipeline`] over it one sample round at
//! a time, and feeds every traced hit to the active [`Integrator`].
//!
//! Passes are the outer loop (§4.9): most integrators run exactly one pass
//! over the whole image budget, PPM alternates a light-indexed
//! photon-deposition pass with a camera-indexed gather pass. Which kind a
//! given pass is is entirely up to [`Integrator::on_next_pass`]'s return
//! value — this module never special-cases PPM by name.

use crate::config::RenderSettings;
use crate::error::{PearRayError, Result};
use crate::integrator::{thread_rng_from, Integrator};
use crate::render::events::{NullObserver, RenderObserver, TileEvent};
use crate::render::output::OutputFramebuffer;
use crate::render::pipeline::StreamPipeline;
use crate::render::tile::RenderTile;
use crate::render::tile_map::{default_tile_size, TileMap};
use crate::scene::camera::RenderCamera;
use crate::scene::SceneDatabase;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Progress snapshot a caller can poll from another thread while
/// [`RenderContext::run`] is in flight (§4.13 "status reporting").
#[derive(Debug, Clone)]
pub struct RenderStatus {
    pub pass: u32,
    pub max_passes: Option<u32>,
    /// Fraction of this pass's tiles that have finished their sample
    /// budget, in `[0, 1]`.
    pub tile_percentage: f32,
    pub finished_pixel_count: u64,
    pub total_pixel_count: u64,
    pub message: String,
}

/// Orchestrates a full render: owns the tile map, output framebuffer,
/// scene handle and integrator, and drives them to completion or
/// cancellation. The worker pool is built once in [`Self::new`] and reused
/// across every pass.
pub struct RenderContext {
    settings: RenderSettings,
    tile_map: TileMap,
    output: Arc<OutputFramebuffer>,
    scene: Arc<SceneDatabase>,
    camera: RenderCamera,
    integrator: Box<dyn Integrator>,
    pool: rayon::ThreadPool,
    cancelled: AtomicBool,
    current_pass: AtomicU32,
    image_w: u32,
    image_h: u32,
    observer: Box<dyn RenderObserver>,
}

impl RenderContext {
    /// Validates `settings`, builds the tile map, framebuffer and worker
    /// pool, and calls [`Integrator::on_start`]. Does not render anything
    /// yet — call [`Self::run`] for that.
    pub fn new(scene: Arc<SceneDatabase>, settings: RenderSettings, mut integrator: Box<dyn Integrator>, image_w: u32, image_h: u32) -> Result<Self> {
        settings.validate()?;
        if image_w == 0 || image_h == 0 {
            return Err(PearRayError::InvalidParameter { name: "image dimensions".into(), reason: "width and height must be non-zero".into() });
        }

        integrator.on_start(&scene, &settings, image_w, image_h);

        let thread_count = settings.resolved_thread_count().max(1) as u32;
        let tile_size = settings.tile_size.unwrap_or_else(|| default_tile_size(thread_count, image_w, image_h));
        let max_samples = integrator.max_samples().max(1);
        let tile_map = TileMap::new(image_w, image_h, tile_size, settings.tile_layout, max_samples, settings.sampler_mode, settings.seed);

        let min_samples = u64::from(settings.adaptive.min_samples.min(max_samples));
        let target_quality = settings.adaptive.enabled.then_some(settings.adaptive.target_quality);
        let output = Arc::new(OutputFramebuffer::new(image_w, image_h, min_samples, target_quality));

        let camera = scene.camera.extract_render_camera();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count as usize)
            .build()
            .map_err(|e| PearRayError::Invariant(format!("failed to build worker pool: {e}")))?;

        Ok(Self {
            settings,
            tile_map,
            output,
            scene,
            camera,
            integrator,
            pool,
            cancelled: AtomicBool::new(false),
            current_pass: AtomicU32::new(0),
            image_w,
            image_h,
            observer: Box::new(NullObserver),
        })
    }

    /// Attaches a [`RenderObserver`] that receives progress events as the
    /// render runs (§9 "runtime telemetry uses an observer trait"). Builder
    /// style since it's only meaningful before [`Self::run`] is called.
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn RenderObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn output(&self) -> &Arc<OutputFramebuffer> {
        &self.output
    }

    /// Cooperative cancellation (§7.4): workers observe this between ray
    /// batches and unwind without finishing the current pass.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn status(&self) -> RenderStatus {
        let pass = self.current_pass.load(Ordering::Relaxed);
        let integrator_status = self.integrator.status(pass);
        RenderStatus {
            pass,
            max_passes: self.integrator.max_passes(),
            tile_percentage: self.tile_map.percentage(),
            finished_pixel_count: self.output.finished_pixel_count(),
            total_pixel_count: u64::from(self.image_w) * u64::from(self.image_h),
            message: integrator_status.message,
        }
    }

    /// Drives every pass to completion (or until cancelled), returning
    /// `Err(PearRayError::Cancelled)` if [`Self::cancel`] was observed
    /// before the render finished naturally.
    pub fn run(&mut self) -> Result<()> {
        let mut pass = 0;
        loop {
            if self.is_cancelled() || !self.integrator.needs_next_pass(pass) {
                break;
            }
            self.current_pass.store(pass, Ordering::Relaxed);
            self.tile_map.reset();
            self.observer.on_pass_started(pass, &self.integrator.status(pass));

            let drives_pipeline = self.integrator.on_next_pass(pass, &self.scene, &self.output);
            if drives_pipeline {
                self.run_pixel_pass();
            }

            self.observer.on_pass_finished(pass);

            let total_pixels = u64::from(self.image_w) * u64::from(self.image_h);
            let finished = self.output.finished_pixel_count();
            self.observer.on_pixel_finished_count_changed(finished, total_pixels);
            if self.settings.adaptive.enabled && finished >= total_pixels {
                break;
            }

            pass += 1;
            if let Some(max) = self.integrator.max_passes() {
                if pass >= max {
                    break;
                }
            }
        }

        self.integrator.on_end();

        if self.is_cancelled() {
            self.observer.on_cancelled();
            return Err(PearRayError::Cancelled);
        }
        Ok(())
    }

    /// Drives the tile/stream-pipeline loop for one camera-ray-indexed
    /// pass: every worker repeatedly claims a free tile, runs it to its
    /// sample budget, and releases it, until the map is drained.
    ///
    /// Tiles entirely outside the crop rectangle are fast-forwarded to
    /// "finished" without tracing a single ray (§8 "Crop rectangle of zero
    /// area: render completes instantly with empty output"); tiles that
    /// only partially overlap the crop still render in full, a
    /// tile-granularity approximation of pixel-exact cropping.
    fn run_pixel_pass(&self) {
        let tile_map = &self.tile_map;
        let output = self.output.as_ref();
        let scene = self.scene.as_ref();
        let camera = self.camera;
        let integrator = self.integrator.as_ref();
        let settings = &self.settings;
        let cancelled = &self.cancelled;
        let image_w = self.image_w;
        let image_h = self.image_h;
        let crop = settings.crop.pixel_bounds(image_w, image_h);
        let thread_count = self.pool.current_num_threads().max(1) as u32;
        let observer = self.observer.as_ref();

        self.pool.scope(|s| {
            for worker in 0..thread_count {
                s.spawn(move |_| {
                    let mut rng = thread_rng_from(settings.seed, u64::from(worker) ^ 0xD1B5_4A32_D192_ED03);
                    let mut pipeline = StreamPipeline::new(settings.max_parallel_rays);

                    while let Some(tile_index) = tile_map.next_free(settings.effective_max_samples()) {
                        if cancelled.load(Ordering::Relaxed) {
                            tile_map.release(tile_index);
                            break;
                        }

                        let tile_event = tile_map.with_tile_mut(tile_index, |tile| TileEvent {
                            index: tile.index(),
                            sx: tile.sx(),
                            sy: tile.sy(),
                            ex: tile.ex(),
                            ey: tile.ey(),
                        });
                        observer.on_tile_claimed(tile_event);

                        let intersects_crop = tile_map.with_tile_mut(tile_index, |tile| {
                            tile.sx() < crop.1 && tile.ex() > crop.0 && tile.sy() < crop.3 && tile.ey() > crop.2
                        });
                        if !intersects_crop {
                            tile_map.with_tile_mut(tile_index, |tile| {
                                while !tile.is_finished() {
                                    tile.inc();
                                }
                            });
                            tile_map.release(tile_index);
                            continue;
                        }

                        pipeline.reset();
                        while !tile_map.with_tile_mut(tile_index, |tile| tile.is_finished()) && !cancelled.load(Ordering::Relaxed) {
                            loop {
                                tile_map.with_tile_mut(tile_index, |tile| {
                                    pipeline.run_iteration(tile, &camera, image_w, image_h, scene, settings.sort_hits, cancelled);
                                });
                                for record in pipeline.drain() {
                                    integrator.on_hit(record.ray, record.hit, scene, settings, output, &mut rng, &mut pipeline);
                                }
                                let round_done = tile_map.with_tile_mut(tile_index, |tile| pipeline.is_finished(tile));
                                if round_done || cancelled.load(Ordering::Relaxed) {
                                    break;
                                }
                            }

                            tile_map.with_tile_mut(tile_index, RenderTile::inc);
                            pipeline.reset();
                        }

                        observer.on_tile_finished(tile_event);
                        tile_map.release(tile_index);
                    }
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntegratorKind;
    use crate::integrator::DirectIntegrator;
    use crate::scene::Camera;

    fn tiny_scene() -> Arc<SceneDatabase> {
        Arc::new(SceneDatabase::new(Camera::default()))
    }

    #[test]
    fn empty_scene_renders_without_error() {
        let scene = tiny_scene();
        let settings = RenderSettings::default().with_integrator(IntegratorKind::Direct);
        let mut ctx = RenderContext::new(scene, settings, Box::new(DirectIntegrator::new()), 4, 4).unwrap();
        ctx.run().unwrap();
        assert_eq!(ctx.status().pass, 0);
    }

    #[test]
    fn zero_width_image_is_rejected() {
        let scene = tiny_scene();
        let settings = RenderSettings::default();
        let result = RenderContext::new(scene, settings, Box::new(DirectIntegrator::new()), 0, 4);
        assert!(result.is_err());
    }

    #[test]
    fn cancel_before_run_yields_cancelled_error() {
        let scene = tiny_scene();
        let settings = RenderSettings::default();
        let mut ctx = RenderContext::new(scene, settings, Box::new(DirectIntegrator::new()), 4, 4).unwrap();
        ctx.cancel();
        assert!(matches!(ctx.run(), Err(PearRayError::Cancelled)));
    }

    #[test]
    fn zero_area_crop_finishes_without_tracing() {
        let scene = tiny_scene();
        let mut settings = RenderSettings::default();
        settings = settings.with_crop(crate::config::CropRect { xmin: 0.5, xmax: 0.5, ymin: 0.5, ymax: 0.5 });
        let mut ctx = RenderContext::new(scene, settings, Box::new(DirectIntegrator::new()), 4, 4).unwrap();
        ctx.run().unwrap();
        assert_eq!(ctx.output().finished_pixel_count(), 0);
    }
}
