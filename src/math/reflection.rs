//! Specular reflection/refraction and Fresnel terms, used by mirror and
//! glass materials (§4.4). Grounded on the call sites in the original's
//! `GlassMaterial::sample` (`Reflection::reflect`, `Reflection::refract`,
//! `Fresnel::schlick`) — the headers themselves were not retained, so the
//! formulas below are the standard textbook ones those names denote.

use glam::Vec3;

/// Reflects `v` (pointing away from the surface, towards the viewer) about
/// `n`, returning the reflected direction (also pointing away from the
/// surface).
#[must_use]
pub fn reflect(n_dot_v: f32, n: Vec3, v: Vec3) -> Vec3 {
    (n * (2.0 * n_dot_v) - v).normalize()
}

/// `cos(theta_t)` of the refracted ray given `cos(theta_i) = n_dot_v` and
/// relative IOR `eta = eta_i / eta_t`. Negative return means total internal
/// reflection.
#[must_use]
pub fn refraction_angle(n_dot_v: f32, eta: f32) -> f32 {
    let sin2_t = eta * eta * (1.0 - n_dot_v * n_dot_v).max(0.0);
    if sin2_t >= 1.0 {
        -1.0
    } else {
        (1.0 - sin2_t).sqrt()
    }
}

/// Refracted direction given `eta`, `cos(theta_i)`, `cos(theta_t)` and the
/// surface normal/view vector (`v` pointing away from the surface).
#[must_use]
pub fn refract(eta: f32, n_dot_v: f32, n_dot_t: f32, n: Vec3, v: Vec3) -> Vec3 {
    (-v * eta + n * (eta * n_dot_v - n_dot_t)).normalize()
}

/// Schlick's approximation to the Fresnel reflectance for unpolarized
/// light, `cos_theta` measured from the surface normal to the incident
/// side's medium (`eta_i`).
#[must_use]
pub fn fresnel_schlick(cos_theta: f32, eta_i: f32, eta_t: f32) -> f32 {
    let r0 = ((eta_i - eta_t) / (eta_i + eta_t)).powi(2);
    let one_minus_cos = (1.0 - cos_theta.abs()).clamp(0.0, 1.0);
    r0 + (1.0 - r0) * one_minus_cos.powi(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_incidence_reflects_straight_back() {
        let n = Vec3::Z;
        let v = Vec3::Z;
        let r = reflect(1.0, n, v);
        assert!((r - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn total_internal_reflection_is_flagged_negative() {
        // Shallow grazing angle from a dense medium into a sparser one.
        let eta = 1.5;
        let n_dot_v = 0.05;
        assert!(refraction_angle(n_dot_v, eta) < 0.0);
    }

    #[test]
    fn schlick_is_near_full_reflectance_at_grazing_angle() {
        let r = fresnel_schlick(0.001, 1.0, 1.55);
        assert!(r > 0.9);
    }

    #[test]
    fn schlick_matches_r0_at_normal_incidence() {
        let eta_i = 1.0;
        let eta_t = 1.55;
        let r0 = ((eta_i - eta_t) / (eta_i + eta_t)).powi(2);
        let r = fresnel_schlick(1.0, eta_i, eta_t);
        assert!((r - r0).abs() < 1e-5);
    }
}
