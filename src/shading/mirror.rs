//! Perfect specular mirror material (§4.4), a single-lobe Dirac BSDF.

use super::{Material, MaterialSample, Rnd3, ScatteringType, ShadingContext};
use crate::math::reflection::reflect;
use crate::scene::{NodeArena, NodeId};
use crate::spectral::SpectralBlob;

pub struct MirrorMaterial {
    specularity: Option<NodeId>,
}

impl MirrorMaterial {
    #[must_use]
    pub fn new(specularity: Option<NodeId>) -> Self {
        Self { specularity }
    }
}

impl Material for MirrorMaterial {
    fn eval(&self, _closure: &ShadingContext, _l: glam::Vec3, _n_dot_l: f32, _nodes: &NodeArena) -> SpectralBlob {
        // Specular lobes are Dirac deltas; integrators must gate on
        // `sample()`'s infinite pdf and never call eval/pdf for them.
        SpectralBlob::ZERO
    }

    fn pdf(&self, _closure: &ShadingContext, _l: glam::Vec3, _n_dot_l: f32) -> f32 {
        f32::INFINITY
    }

    fn sample(&self, closure: &ShadingContext, _rnd: Rnd3, nodes: &NodeArena) -> MaterialSample {
        let specularity = match self.specularity.and_then(|id| nodes.get(id)) {
            Some(node) => node.eval_spectral(closure),
            None => SpectralBlob::splat(1.0),
        };
        let l = reflect(closure.n_dot_v, closure.n, closure.v);
        MaterialSample {
            l,
            pdf_solid_angle: f32::INFINITY,
            path_weight: specularity.average().clamp(0.0, 1.0),
            scattering_type: ScatteringType::SpecularReflect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::{Derivative2, ShadingFlags};
    use glam::Vec3;

    #[test]
    fn reflects_straight_back_at_normal_incidence() {
        let m = MirrorMaterial::new(None);
        let c = ShadingContext {
            p: Vec3::ZERO,
            dpdu: Vec3::X,
            dpdv: Vec3::Y,
            dpdx: Vec3::ZERO,
            dpdy: Vec3::ZERO,
            n: Vec3::Z,
            ng: Vec3::Z,
            nx: Vec3::X,
            ny: Vec3::Y,
            v: Vec3::Z,
            n_dot_v: 1.0,
            ng_dot_v: 1.0,
            uvw: Vec3::ZERO,
            duvw: Derivative2::default(),
            primitive_id: 0,
            entity_id: None,
            material_id: None,
            emission_id: None,
            flags: ShadingFlags::empty(),
            wavelengths: [550.0; 4],
            wavelength_index: 0,
            time: 0.0,
            depth: 0,
        };
        let nodes = NodeArena::with_key();
        let s = m.sample(&c, Rnd3 { x: 0.0, y: 0.0, z: 0.0 }, &nodes);
        assert!(s.pdf_solid_angle.is_infinite());
        assert!((s.l - Vec3::Z).length() < 1e-5);
    }
}
