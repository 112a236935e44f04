//! Render telemetry observer (§9 "Global logger / registry" redesign:
//! "runtime telemetry uses an observer trait the engine emits events to,
//! decoupling measurement from transport").
//!
//! [`RenderContext`](super::RenderContext) never logs progress itself; it
//! only calls into whatever [`RenderObserver`] the caller attached. The
//! default [`LoggingObserver`] forwards events to the `log` facade the way
//! the rest of the engine already does (§4.11), but an embedder (a GUI
//! progress bar, a test harness counting events) can swap in its own
//! without the engine knowing transport exists.

use crate::integrator::IntegratorStatus;

/// One claimed-and-released tile, reported after [`RenderObserver::on_tile_finished`]
/// so observers can build a live progress grid without polling the tile map.
#[derive(Debug, Clone, Copy)]
pub struct TileEvent {
    pub index: u32,
    pub sx: u32,
    pub sy: u32,
    pub ex: u32,
    pub ey: u32,
}

/// Events the render context emits over the life of a render (§9).
/// Every method has a no-op default so an observer only overrides what it
/// cares about.
pub trait RenderObserver: Send + Sync {
    fn on_pass_started(&self, pass: u32, status: &IntegratorStatus) {
        let _ = (pass, status);
    }

    fn on_pass_finished(&self, pass: u32) {
        let _ = pass;
    }

    fn on_tile_claimed(&self, tile: TileEvent) {
        let _ = tile;
    }

    fn on_tile_finished(&self, tile: TileEvent) {
        let _ = tile;
    }

    /// Called whenever [`crate::render::OutputFramebuffer::finished_pixel_count`]
    /// grows, carrying the new count (§4.7 "used by progress reporting").
    fn on_pixel_finished_count_changed(&self, finished: u64, total: u64) {
        let _ = (finished, total);
    }

    fn on_numerical_fault(&self, pixel: (u32, u32), feedback: super::output::Feedback) {
        let _ = (pixel, feedback);
    }

    fn on_cancelled(&self) {}
}

/// Forwards every event to the `log` facade, grounded on the teacher's
/// direct `log::info!`/`log::warn!` calls rather than a context object
/// threaded through construction (§4.11).
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl RenderObserver for LoggingObserver {
    fn on_pass_started(&self, pass: u32, status: &IntegratorStatus) {
        log::info!("pass {pass} started: {}", status.message);
    }

    fn on_pass_finished(&self, pass: u32) {
        log::info!("pass {pass} finished");
    }

    fn on_tile_finished(&self, tile: TileEvent) {
        log::debug!("tile {} ({},{})-({},{}) finished", tile.index, tile.sx, tile.sy, tile.ex, tile.ey);
    }

    fn on_pixel_finished_count_changed(&self, finished: u64, total: u64) {
        log::info!("{finished}/{total} pixels converged");
    }

    fn on_numerical_fault(&self, pixel: (u32, u32), feedback: super::output::Feedback) {
        log::warn!("numerical fault at {pixel:?}: {feedback:?}");
    }

    fn on_cancelled(&self) {
        log::warn!("render cancelled");
    }
}

/// Discards every event; the default for [`crate::render::RenderContext`]
/// when the caller doesn't supply an observer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl RenderObserver for NullObserver {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingObserver {
        tiles_finished: AtomicU32,
    }

    impl RenderObserver for CountingObserver {
        fn on_tile_finished(&self, _tile: TileEvent) {
            self.tiles_finished.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn observer_default_methods_are_no_ops() {
        let obs = NullObserver;
        obs.on_pass_started(0, &IntegratorStatus { pass: 0, percentage: 0.0, message: String::new() });
        obs.on_cancelled();
    }

    #[test]
    fn custom_observer_counts_tile_events() {
        let obs = CountingObserver::default();
        obs.on_tile_finished(TileEvent { index: 0, sx: 0, sy: 0, ex: 8, ey: 8 });
        obs.on_tile_finished(TileEvent { index: 1, sx: 8, sy: 0, ex: 16, ey: 8 });
        assert_eq!(obs.tiles_finished.load(Ordering::Relaxed), 2);
    }
}
