//! Dielectric glass material (§4.4), ported from the original's
//! `GlassMaterial`: a two-path branching Dirac BSDF (reflect or refract)
//! weighted by Schlick's Fresnel term, with a thin-surface mode that
//! suppresses total-internal-reflection bounces.

use super::{Material, MaterialSample, Rnd3, ScatteringType, ShadingContext};
use crate::math::reflection::{fresnel_schlick, reflect, refract, refraction_angle};
use crate::scene::{NodeArena, NodeId};
use crate::spectral::SpectralBlob;

pub struct GlassMaterial {
    specularity: Option<NodeId>,
    ior: Option<NodeId>,
    thin: bool,
}

impl GlassMaterial {
    #[must_use]
    pub fn new(specularity: Option<NodeId>, ior: Option<NodeId>, thin: bool) -> Self {
        Self { specularity, ior, thin }
    }

    fn ior_value(&self, closure: &ShadingContext, nodes: &NodeArena) -> f32 {
        match self.ior.and_then(|id| nodes.get(id)) {
            Some(node) => node.eval_scalar(closure),
            None => 1.55,
        }
    }

    fn specularity_value(&self, closure: &ShadingContext, nodes: &NodeArena) -> SpectralBlob {
        match self.specularity.and_then(|id| nodes.get(id)) {
            Some(node) => node.eval_spectral(closure),
            None => SpectralBlob::splat(1.0),
        }
    }

    fn reflectance(&self, ior: f32, closure: &ShadingContext) -> f32 {
        if closure.is_inside() {
            fresnel_schlick(-closure.n_dot_v, ior, 1.0)
        } else {
            fresnel_schlick(-closure.n_dot_v, 1.0, ior)
        }
    }
}

impl Material for GlassMaterial {
    fn eval(&self, closure: &ShadingContext, _l: glam::Vec3, _n_dot_l: f32, nodes: &NodeArena) -> SpectralBlob {
        self.specularity_value(closure, nodes)
    }

    fn pdf(&self, _closure: &ShadingContext, _l: glam::Vec3, _n_dot_l: f32) -> f32 {
        f32::INFINITY
    }

    fn sample(&self, closure: &ShadingContext, rnd: Rnd3, nodes: &NodeArena) -> MaterialSample {
        let ior = self.ior_value(closure, nodes);
        let eta = if closure.is_inside() { ior } else { 1.0 / ior };
        let n_dot_t = refraction_angle(closure.n_dot_v, eta);

        let mut sample = MaterialSample {
            l: closure.n,
            pdf_solid_angle: f32::INFINITY,
            path_weight: 1.0,
            scattering_type: ScatteringType::SpecularReflect,
        };

        if n_dot_t < 0.0 {
            // Total internal reflection.
            if self.thin {
                sample.path_weight = 0.0;
                sample.l = reflect(closure.n_dot_v, closure.n, closure.v);
            } else {
                sample.path_weight = 1.0;
                sample.l = reflect(closure.n_dot_v, closure.n, closure.v);
            }
        } else {
            let reflectance = self.reflectance(ior, closure);
            if rnd.x <= reflectance {
                sample.path_weight = reflectance;
                sample.l = reflect(closure.n_dot_v, closure.n, closure.v);
                sample.scattering_type = ScatteringType::SpecularReflect;
            } else {
                sample.path_weight = 1.0 - reflectance;
                sample.l = refract(eta, closure.n_dot_v, n_dot_t, closure.n, closure.v);
                sample.scattering_type = ScatteringType::SpecularTransmit;
            }
        }

        debug_assert!((0.0..=1.0).contains(&sample.path_weight));
        sample
    }

    fn sample_path_count(&self) -> u32 {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::{Derivative2, ShadingFlags};
    use glam::Vec3;

    fn closure(n_dot_v: f32, inside: bool) -> ShadingContext {
        let mut flags = ShadingFlags::empty();
        if inside {
            flags |= ShadingFlags::INSIDE;
        }
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
            n_dot_v,
            ng_dot_v: n_dot_v,
            uvw: Vec3::ZERO,
            duvw: Derivative2::default(),
            primitive_id: 0,
            entity_id: None,
            material_id: None,
            emission_id: None,
            flags,
            wavelengths: [550.0; 4],
            wavelength_index: 0,
            time: 0.0,
            depth: 0,
        }
    }

    #[test]
    fn sample_pdf_is_always_specular() {
        let m = GlassMaterial::new(None, None, false);
        let c = closure(1.0, false);
        let nodes = NodeArena::with_key();
        let s = m.sample(&c, Rnd3 { x: 0.9, y: 0.0, z: 0.0 }, &nodes);
        assert!(s.pdf_solid_angle.is_infinite());
    }

    #[test]
    fn grazing_total_internal_reflection_stays_bounded() {
        let m = GlassMaterial::new(None, None, false);
        let c = closure(0.02, true);
        let nodes = NodeArena::with_key();
        let s = m.sample(&c, Rnd3 { x: 0.1, y: 0.0, z: 0.0 }, &nodes);
        assert!((0.0..=1.0).contains(&s.path_weight));
    }

    #[test]
    fn two_sampling_strategies_are_exposed() {
        let m = GlassMaterial::new(None, None, false);
        assert_eq!(m.sample_path_count(), 2);
    }
}
