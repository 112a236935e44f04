//! Emissive surface contribution (§4.4), grounded on the same node-arena
//! indirection [`crate::shading::diffuse::DiffuseMaterial`] uses for its
//! albedo.

use super::{Emission, ShadingContext};
use crate::scene::{NodeArena, NodeId};
use crate::spectral::SpectralBlob;

/// Constant (or node-driven) surface radiance. One-sided emitters (the
/// Cornell box ceiling light, §8 scenario 2) only radiate out of the
/// geometric-normal-facing side.
pub struct DiffuseEmission {
    radiance: NodeId,
    one_sided: bool,
}

impl DiffuseEmission {
    #[must_use]
    pub fn new(radiance: NodeId, one_sided: bool) -> Self {
        Self { radiance, one_sided }
    }
}

impl Emission for DiffuseEmission {
    fn eval(&self, closure: &ShadingContext, nodes: &NodeArena) -> SpectralBlob {
        if self.one_sided && closure.ng_dot_v <= 0.0 {
            return SpectralBlob::ZERO;
        }
        nodes.get(self.radiance).map_or(SpectralBlob::ZERO, |n| n.eval_spectral(closure))
    }

    fn one_sided(&self) -> bool {
        self.one_sided
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::node::ShadingNode;
    use crate::shading::{Derivative2, ShadingFlags};
    use glam::Vec3;
    use slotmap::SlotMap;

    fn closure(ng_dot_v: f32) -> ShadingContext {
        ShadingContext {
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
            n_dot_v: ng_dot_v,
            ng_dot_v,
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
        }
    }

    #[test]
    fn one_sided_emitter_is_dark_from_behind() {
        let mut nodes: NodeArena = SlotMap::with_key();
        let id = nodes.insert(ShadingNode::ConstSpectral(SpectralBlob::splat(4.0)));
        let e = DiffuseEmission::new(id, true);
        assert_eq!(e.eval(&closure(1.0), &nodes).sum(), 16.0);
        assert_eq!(e.eval(&closure(-1.0), &nodes).sum(), 0.0);
    }

    #[test]
    fn two_sided_emitter_ignores_facing() {
        let mut nodes: NodeArena = SlotMap::with_key();
        let id = nodes.insert(ShadingNode::ConstSpectral(SpectralBlob::splat(2.0)));
        let e = DiffuseEmission::new(id, false);
        assert_eq!(e.eval(&closure(-1.0), &nodes).sum(), 8.0);
    }
}
