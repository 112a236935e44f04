//! Direction sampling projections (§4.3, component D).
//!
//! Each projection returns both the sampled direction (in the local frame,
//! +Z as the pole) and its PDF, so integrators can combine sampling
//! strategies directly.

use glam::Vec3;
use std::f32::consts::PI;

/// A sampled direction with its probability density.
#[derive(Debug, Clone, Copy)]
pub struct DirectionSample {
    pub direction: Vec3,
    pub pdf: f32,
}

/// Uniformly samples the full sphere from two canonical `[0, 1)` draws.
#[must_use]
pub fn uniform_sphere(u: f32, v: f32) -> DirectionSample {
    let z = 1.0 - 2.0 * u;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * v;
    DirectionSample {
        direction: Vec3::new(r * phi.cos(), r * phi.sin(), z),
        pdf: 1.0 / (4.0 * PI),
    }
}

/// Uniformly samples the hemisphere around +Z.
#[must_use]
pub fn uniform_hemisphere(u: f32, v: f32) -> DirectionSample {
    let z = u;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * v;
    DirectionSample {
        direction: Vec3::new(r * phi.cos(), r * phi.sin(), z),
        pdf: 1.0 / (2.0 * PI),
    }
}

/// Cosine-weighted hemisphere sample around +Z (Malley's method).
#[must_use]
pub fn cosine_hemisphere(u: f32, v: f32) -> DirectionSample {
    let r = u.sqrt();
    let phi = 2.0 * PI * v;
    let x = r * phi.cos();
    let y = r * phi.sin();
    let z = (1.0 - u).max(0.0).sqrt();
    DirectionSample {
        direction: Vec3::new(x, y, z),
        pdf: z / PI,
    }
}

/// Phong-lobe hemisphere sample around +Z with exponent `n`.
#[must_use]
pub fn phong_hemisphere(u: f32, v: f32, n: f32) -> DirectionSample {
    let cos_theta = u.powf(1.0 / (n + 1.0));
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * v;
    DirectionSample {
        direction: Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta),
        pdf: (n + 1.0) / (2.0 * PI) * cos_theta.powf(n),
    }
}

/// Uniform barycentric coordinates over a triangle from two canonical
/// draws, via the standard square-root remap.
#[must_use]
pub fn uniform_triangle(u: f32, v: f32) -> (f32, f32, f32) {
    let su = u.sqrt();
    let b0 = 1.0 - su;
    let b1 = v * su;
    (b0, b1, 1.0 - b0 - b1)
}

/// Builds an orthonormal tangent frame `(x, y)` around a unit normal `n`
/// (Duff et al.'s branchless construction), used to rotate the local-frame
/// samples above into world space.
#[must_use]
pub fn onb_from_normal(n: Vec3) -> (Vec3, Vec3) {
    let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;
    let x = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let y = Vec3::new(b, sign + n.y * n.y * a, -n.y);
    (x, y)
}

/// Rotates a local-frame direction (with +Z as pole) into world space
/// around `normal`.
#[must_use]
pub fn to_world(local: Vec3, normal: Vec3) -> Vec3 {
    let (x, y) = onb_from_normal(normal);
    x * local.x + y * local.y + normal * local.z
}
