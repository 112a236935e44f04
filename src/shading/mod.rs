//! Shading closure and material/emission trait family (component B, §4.4,
//! §9 "Re-architect as tagged variants behind a trait-style interface of
//! four methods: `eval`, `pdf`, `sample`, `freeze`").

pub mod context;
pub mod diffuse;
pub mod emission;
pub mod glass;
pub mod mirror;
pub mod node;

pub use context::{Derivative2, MaterialSample, Rnd3, ScatteringType, ShadingContext, ShadingFlags};
pub use diffuse::DiffuseMaterial;
pub use emission::DiffuseEmission;
pub use glass::GlassMaterial;
pub use mirror::MirrorMaterial;
pub use node::ShadingNode;

use crate::scene::NodeArena;
use crate::spectral::SpectralBlob;

/// The surface scattering contract every material implements (§4.4).
///
/// Materials do not own their input nodes; nodes live in a
/// [`crate::scene::SceneDatabase`] arena and are referenced by
/// [`crate::scene::NodeId`], so every method that needs a node's value
/// takes the owning scene's [`NodeArena`] explicitly.
pub trait Material: Send + Sync {
    /// BSDF value (cosine term applied by the caller, not folded in here —
    /// §9 ambiguity (a): the cosine is always the integrator's job),
    /// evaluated for a non-specular direction `l`. Must not be called when
    /// the generating `sample()` reported an infinite pdf (§4.4 invariant).
    fn eval(&self, closure: &ShadingContext, l: glam::Vec3, n_dot_l: f32, nodes: &NodeArena) -> SpectralBlob;

    /// Solid-angle PDF for `l`, matching `eval`'s lobe.
    fn pdf(&self, closure: &ShadingContext, l: glam::Vec3, n_dot_l: f32) -> f32;

    /// Draws an outgoing direction. `pdf_solid_angle = infinity` marks a
    /// specular (Dirac) lobe.
    fn sample(&self, closure: &ShadingContext, rnd: Rnd3, nodes: &NodeArena) -> MaterialSample;

    /// Number of mutually-exclusive sampling strategies a branching BSDF
    /// exposes (e.g. glass: reflect or refract); `path_weight` sums to 1
    /// across them. Defaults to 1 for single-lobe materials.
    fn sample_path_count(&self) -> u32 {
        1
    }

    /// Called once after the scene graph is fully populated and before any
    /// render thread reads `self`; the only point at which interior state
    /// may be prepared. No-op by default.
    fn freeze(&mut self) {}
}

/// Emissive surface contribution (§4.4 "Emissions expose `eval(closure)`").
pub trait Emission: Send + Sync {
    fn eval(&self, closure: &ShadingContext, nodes: &NodeArena) -> SpectralBlob;

    /// Restricts emission to the side the geometric normal faces.
    fn one_sided(&self) -> bool {
        false
    }

    fn freeze(&mut self) {}
}
