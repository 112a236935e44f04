//! Lambertian diffuse material (§4.4), grounded on the original's
//! `DiffuseMaterial`.

use super::{Material, MaterialSample, Rnd3, ScatteringType, ShadingContext};
use crate::math::projection::{cosine_hemisphere, to_world};
use crate::scene::{NodeArena, NodeId};
use crate::spectral::SpectralBlob;
use std::f32::consts::FRAC_1_PI;

/// `albedo` is `None` until [`Material::freeze`] would default it to white
/// (the caller is expected to have inserted a white constant node instead,
/// since this trait has no scene-mutation access at freeze time); falls
/// back to unit albedo in `eval` when absent.
pub struct DiffuseMaterial {
    albedo: Option<NodeId>,
}

impl DiffuseMaterial {
    #[must_use]
    pub fn new(albedo: Option<NodeId>) -> Self {
        Self { albedo }
    }

    #[must_use]
    pub fn albedo(&self) -> Option<NodeId> {
        self.albedo
    }

    fn albedo_value(&self, closure: &ShadingContext, nodes: &NodeArena) -> SpectralBlob {
        match self.albedo.and_then(|id| nodes.get(id)) {
            Some(node) => node.eval_spectral(closure),
            None => SpectralBlob::splat(1.0),
        }
    }
}

impl Material for DiffuseMaterial {
    fn eval(&self, closure: &ShadingContext, _l: glam::Vec3, n_dot_l: f32, nodes: &NodeArena) -> SpectralBlob {
        if n_dot_l <= 0.0 || closure.is_grazing() {
            return SpectralBlob::ZERO;
        }
        self.albedo_value(closure, nodes) * FRAC_1_PI
    }

    fn pdf(&self, _closure: &ShadingContext, _l: glam::Vec3, n_dot_l: f32) -> f32 {
        if n_dot_l <= 0.0 {
            0.0
        } else {
            n_dot_l * FRAC_1_PI
        }
    }

    fn sample(&self, closure: &ShadingContext, rnd: Rnd3, _nodes: &NodeArena) -> MaterialSample {
        let local = cosine_hemisphere(rnd.x, rnd.y);
        let l = to_world(local.direction, closure.n);
        MaterialSample {
            l,
            pdf_solid_angle: local.pdf,
            path_weight: 1.0,
            scattering_type: ScatteringType::DiffuseReflect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::{Derivative2, ShadingFlags};
    use glam::Vec3;

    fn closure() -> ShadingContext {
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
        }
    }

    #[test]
    fn backfacing_direction_has_zero_contribution() {
        let m = DiffuseMaterial::new(None);
        let c = closure();
        let nodes = NodeArena::with_key();
        assert_eq!(m.eval(&c, Vec3::Z, -0.5, &nodes).sum(), 0.0);
        assert_eq!(m.pdf(&c, Vec3::Z, -0.5), 0.0);
    }

    #[test]
    fn sampled_direction_stays_in_the_hemisphere() {
        let m = DiffuseMaterial::new(None);
        let c = closure();
        let nodes = NodeArena::with_key();
        let s = m.sample(&c, Rnd3 { x: 0.3, y: 0.6, z: 0.0 }, &nodes);
        assert!(s.l.dot(c.n) > 0.0);
        assert!(s.pdf_solid_angle.is_finite());
        assert_eq!(s.path_weight, 1.0);
    }

    #[test]
    fn unit_albedo_matches_lambertian_normalization() {
        let m = DiffuseMaterial::new(None);
        let c = closure();
        let nodes = NodeArena::with_key();
        let v = m.eval(&c, Vec3::Z, 1.0, &nodes);
        assert!((v.average() - FRAC_1_PI).abs() < 1e-6);
    }
}
