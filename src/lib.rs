//! PearRay render engine core.
//!
//! This crate implements the offline physically-based spectral renderer's
//! render engine: tile-partitioned cooperative scheduling over a pluggable
//! [`integrator`], the shading closure materials/emissions/nodes evaluate
//! against, and the spectral output pipeline. Scene description parsing,
//! plugin discovery, mesh loading, image I/O and the viewer are external
//! collaborators named by their interfaces only (§1, §6 of the design
//! spec this crate implements) — [`scene::SceneDatabase`] is populated by
//! a loader that lives outside this crate.
//!
//! Module layout mirrors the component table: [`spectral`] (A),
//! [`shading`] (B), [`sampler`] (C), [`math`] (D), [`photon`] (E),
//! [`render`] (F/G/H/J), [`integrator`] (I), [`scene`] (K plus the
//! in-memory graph).

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod integrator;
pub mod logging;
pub mod math;
pub mod photon;
pub mod render;
pub mod sampler;
pub mod scene;
pub mod shading;
pub mod spectral;

pub use config::{IntegratorKind, RenderSettings};
pub use error::{PearRayError, Result};
pub use render::{RenderContext, RenderStatus};
pub use scene::SceneDatabase;

/// Constructs the integrator named by `settings.integrator`, the single
/// place that maps [`config::IntegratorKind`] onto a concrete
/// [`integrator::Integrator`] implementation (used by the binary and by
/// any embedder that does not want to match on the enum itself).
#[must_use]
pub fn build_integrator(settings: &RenderSettings) -> Box<dyn integrator::Integrator> {
    match settings.integrator {
        IntegratorKind::Direct => Box::new(integrator::DirectIntegrator::new()),
        IntegratorKind::Bidirectional => Box::new(integrator::BidirectionalIntegrator::new()),
        IntegratorKind::Ppm => Box::new(integrator::PpmIntegrator::new()),
    }
}
