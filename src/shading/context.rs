//! Shading closure (component B, §4.4 / §3 "Shading context / closure").
//!
//! Populated by scene traversal at a hit and handed to materials, emissions
//! and the integrators. Kept as a plain POD-ish value type (no trait
//! objects, no owned allocations) so it can be built on the stack per
//! intersection without touching the allocator.

use crate::scene::{EntityId, MaterialId, EmissionId};
use crate::spectral::SpectralBlob;
use glam::Vec3;

bitflags::bitflags! {
    /// Per-hit state that doesn't fit naturally as a separate field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShadingFlags: u32 {
        /// The ray origin is inside the entity's enclosed volume.
        const INSIDE = 1 << 0;
    }
}

/// Screen-space or UV derivative pair, used for `dPdx/dPdy` and the `UVW`
/// screen derivatives.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Derivative2 {
    pub dx: Vec3,
    pub dy: Vec3,
}

/// The full per-hit shading state (§3 "Shading context / closure").
///
/// Invariant: `n`, `ng`, `nx`, `ny` are unit length; `{nx, ny, n}` is
/// right-handed; `n_dot_v == n.dot(-ray_dir)`.
#[derive(Debug, Clone, Copy)]
pub struct ShadingContext {
    /// Geometric hit point.
    pub p: Vec3,
    pub dpdu: Vec3,
    pub dpdv: Vec3,
    pub dpdx: Vec3,
    pub dpdy: Vec3,

    /// Shading normal (possibly bump/normal-mapped).
    pub n: Vec3,
    /// Geometric (unperturbed) normal.
    pub ng: Vec3,
    /// Tangent-frame basis completing `n` into a right-handed frame.
    pub nx: Vec3,
    pub ny: Vec3,

    /// Direction towards the ray origin (`-ray.direction`, normalized).
    pub v: Vec3,
    pub n_dot_v: f32,
    pub ng_dot_v: f32,

    pub uvw: Vec3,
    pub duvw: Derivative2,

    pub primitive_id: u32,
    pub entity_id: Option<EntityId>,
    pub material_id: Option<MaterialId>,
    pub emission_id: Option<EmissionId>,

    pub flags: ShadingFlags,

    /// Hero wavelength quartet, copied from the ray that produced this hit.
    pub wavelengths: [f32; 4],
    /// Which lane of `wavelengths` indexed colour lookups should resolve
    /// against, when a node only evaluates a single wavelength.
    pub wavelength_index: usize,

    /// Copied from the generating ray, for the output framebuffer's time
    /// and depth auxiliary channels (§4.7).
    pub time: f32,
    pub depth: u32,
}

impl ShadingContext {
    #[must_use]
    pub fn is_inside(&self) -> bool {
        self.flags.contains(ShadingFlags::INSIDE)
    }

    /// Grazing-angle guard shared by every material (§9 edge cases:
    /// "NdotV = 0 grazing: materials return zero or specular-only; no NaN
    /// propagation").
    #[must_use]
    pub fn is_grazing(&self) -> bool {
        self.n_dot_v.abs() < 1e-5
    }

    #[must_use]
    pub fn hero_wavelength(&self) -> f32 {
        self.wavelengths[self.wavelength_index.min(3)]
    }
}

/// The result of `Material::sample` (§4.4).
#[derive(Debug, Clone, Copy)]
pub struct MaterialSample {
    pub l: Vec3,
    pub pdf_solid_angle: f32,
    pub path_weight: f32,
    pub scattering_type: ScatteringType,
}

impl MaterialSample {
    #[must_use]
    pub fn is_specular(&self) -> bool {
        self.pdf_solid_angle.is_infinite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScatteringType {
    DiffuseReflect,
    DiffuseTransmit,
    SpecularReflect,
    SpecularTransmit,
}

/// Two pseudo-random numbers plus an independent one, the `rnd` argument to
/// `Material::sample` (lobe selection commonly consumes the third).
#[derive(Debug, Clone, Copy)]
pub struct Rnd3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct SpectralSample {
    pub value: SpectralBlob,
}
