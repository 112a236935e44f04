//! Light-sampling geometry (§4.9 "area-sample N_light times", §3 "a light
//! with no finite extent"), grounded on the original's per-light area
//! sampling and on the Cornell-box/furnace end-to-end scenarios of §8.
//!
//! Mesh geometry is an external collaborator (§1), so area sampling over an
//! arbitrary triangle mesh is out of scope; what the integrators need is
//! *some* concrete way to draw a point (or direction, for infinite lights)
//! with a known pdf. This module defines that contract and the handful of
//! analytic shapes (sphere, rectangle, constant environment) the test
//! scenes in §8 actually use, the same way `src/shading` supplies concrete
//! materials for an otherwise trait-based `Material` contract.

use crate::spectral::SpectralBlob;
use glam::Vec3;
use std::f32::consts::PI;

/// A drawn point on an area light's surface.
#[derive(Debug, Clone, Copy)]
pub struct AreaLightSample {
    pub point: Vec3,
    pub normal: Vec3,
    /// Pdf with respect to surface area at `point`.
    pub pdf_area: f32,
}

/// Analytic area sampling for a finite emitter (§4.9 "area-sample N_light
/// times"). Entities carry an optional `Arc<dyn AreaLightSampler>`
/// alongside their emission id; the emission supplies the radiance value,
/// this supplies the geometry.
pub trait AreaLightSampler: Send + Sync {
    fn sample(&self, u: f32, v: f32) -> AreaLightSample;
    fn surface_area(&self) -> f32;
}

/// Uniform sphere-surface sampling, the shape used by the furnace and PPM
/// end-to-end scenarios (§8).
pub struct SphereAreaLight {
    pub center: Vec3,
    pub radius: f32,
}

impl AreaLightSampler for SphereAreaLight {
    fn sample(&self, u: f32, v: f32) -> AreaLightSample {
        let dir = crate::math::uniform_sphere(u, v).direction;
        AreaLightSample {
            point: self.center + dir * self.radius,
            normal: dir,
            pdf_area: 1.0 / self.surface_area(),
        }
    }

    fn surface_area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }
}

/// Axis-aligned rectangle in world space, the shape used by the Cornell
/// box ceiling light (§8 scenario 2).
pub struct RectAreaLight {
    pub origin: Vec3,
    pub edge_u: Vec3,
    pub edge_v: Vec3,
    pub normal: Vec3,
}

impl AreaLightSampler for RectAreaLight {
    fn sample(&self, u: f32, v: f32) -> AreaLightSample {
        AreaLightSample {
            point: self.origin + self.edge_u * u + self.edge_v * v,
            normal: self.normal,
            pdf_area: 1.0 / self.surface_area(),
        }
    }

    fn surface_area(&self) -> f32 {
        self.edge_u.cross(self.edge_v).length()
    }
}

/// A drawn direction towards an infinite light, with its solid-angle pdf.
#[derive(Debug, Clone, Copy)]
pub struct InfiniteLightSample {
    pub direction: Vec3,
    pub pdf_solid_angle: f32,
}

/// Direction sampling and radiance evaluation for a light with no finite
/// extent (§3 "Infinite lights are sampled along the same MIS combiner
/// using their solid-angle pdf").
pub trait InfiniteLightSampler: Send + Sync {
    fn sample(&self, u: f32, v: f32) -> InfiniteLightSample;
    fn pdf(&self, direction: Vec3) -> f32;
    fn radiance(&self, direction: Vec3, wavelengths: [f32; 4]) -> SpectralBlob;
}

/// Constant-radiance environment, the light used by the furnace test (§8
/// scenario 1): uniform emission in every direction, solid-angle pdf
/// `1 / 4*pi` matching uniform sphere sampling.
pub struct ConstantEnvironmentLight {
    pub radiance: SpectralBlob,
}

impl InfiniteLightSampler for ConstantEnvironmentLight {
    fn sample(&self, u: f32, v: f32) -> InfiniteLightSample {
        let dir = crate::math::uniform_sphere(u, v).direction;
        InfiniteLightSample { direction: dir, pdf_solid_angle: 1.0 / (4.0 * PI) }
    }

    fn pdf(&self, _direction: Vec3) -> f32 {
        1.0 / (4.0 * PI)
    }

    fn radiance(&self, _direction: Vec3, wavelengths: [f32; 4]) -> SpectralBlob {
        let _ = wavelengths;
        self.radiance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_light_pdf_matches_inverse_surface_area() {
        let light = SphereAreaLight { center: Vec3::ZERO, radius: 2.0 };
        let sample = light.sample(0.3, 0.7);
        assert!((sample.point - light.center).length() - light.radius < 1e-4);
        assert!((sample.pdf_area - 1.0 / light.surface_area()).abs() < 1e-6);
    }

    #[test]
    fn rect_light_sample_stays_on_the_plane() {
        let light = RectAreaLight {
            origin: Vec3::new(-1.0, 5.0, -1.0),
            edge_u: Vec3::new(2.0, 0.0, 0.0),
            edge_v: Vec3::new(0.0, 0.0, 2.0),
            normal: Vec3::NEG_Y,
        };
        let s = light.sample(0.5, 0.5);
        assert!((s.point.y - 5.0).abs() < 1e-6);
    }

    #[test]
    fn constant_environment_has_uniform_radiance() {
        let env = ConstantEnvironmentLight { radiance: SpectralBlob::splat(1.0) };
        assert_eq!(env.radiance(Vec3::X, [550.0; 4]), SpectralBlob::splat(1.0));
        assert!((env.pdf(Vec3::X) - 1.0 / (4.0 * PI)).abs() < 1e-6);
    }
}
