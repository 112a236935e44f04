//! Scene camera (§3 "camera", §4 "`construct_camera_ray`").
//!
//! Mirrors the teacher's authoring-vs-render split: [`Camera`] is the
//! mutable struct a scene loader populates, [`RenderCamera`] is the POD
//! snapshot handed to worker threads once the render starts.

use crate::render::Ray;
use glam::{Affine3A, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub projection_type: ProjectionType,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub ortho_size: f32,
    /// Depth-of-field lens radius; 0 disables lens sampling.
    pub lens_radius: f32,
    pub focal_distance: f32,
    pub world: Affine3A,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection_type: ProjectionType::Perspective,
            fov: 60.0_f32.to_radians(),
            aspect: 1.0,
            near: 0.01,
            far: 1000.0,
            ortho_size: 10.0,
            lens_radius: 0.0,
            focal_distance: 1.0,
            world: Affine3A::IDENTITY,
        }
    }
}

impl Camera {
    #[must_use]
    pub fn extract_render_camera(&self) -> RenderCamera {
        let half_height = (self.fov * 0.5).tan();
        let half_width = half_height * self.aspect;
        RenderCamera {
            position: self.world.translation.into(),
            right: self.world.matrix3.x_axis.into(),
            up: self.world.matrix3.y_axis.into(),
            forward: (-self.world.matrix3.z_axis).into(),
            half_width,
            half_height,
            lens_radius: self.lens_radius,
            focal_distance: self.focal_distance,
        }
    }
}

/// Stack-resident snapshot consumed by render threads; no authoring fields.
#[derive(Debug, Clone, Copy)]
pub struct RenderCamera {
    pub position: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
    pub half_width: f32,
    pub half_height: f32,
    pub lens_radius: f32,
    pub focal_distance: f32,
}

impl RenderCamera {
    /// Builds a camera ray through normalized film coordinates `ndc` in
    /// `[-1, 1]^2`, optionally jittered onto a thin lens by `lens_uv` (a
    /// disk sample in `[0,1]^2`, mapped to the unit disk internally).
    #[must_use]
    pub fn construct_camera_ray(
        &self,
        ndc: Vec2,
        lens_uv: Vec2,
        pixel: u32,
        wavelengths: [f32; 4],
        time: f32,
    ) -> Ray {
        let dir = (self.forward
            + self.right * (ndc.x * self.half_width)
            + self.up * (ndc.y * self.half_height))
            .normalize();

        if self.lens_radius <= 0.0 {
            return Ray::primary(self.position, dir, pixel, wavelengths, time);
        }

        let (lx, ly) = concentric_disk_sample(lens_uv.x, lens_uv.y);
        let lens_offset = (self.right * lx + self.up * ly) * self.lens_radius;
        let focal_point = self.position + dir * (self.focal_distance / dir.dot(self.forward));
        let origin = self.position + lens_offset;
        let direction = (focal_point - origin).normalize();
        Ray::primary(origin, direction, pixel, wavelengths, time)
    }
}

fn concentric_disk_sample(u: f32, v: f32) -> (f32, f32) {
    let ox = 2.0 * u - 1.0;
    let oy = 2.0 * v - 1.0;
    if ox == 0.0 && oy == 0.0 {
        return (0.0, 0.0);
    }
    let (r, theta) = if ox.abs() > oy.abs() {
        (ox, std::f32::consts::FRAC_PI_4 * (oy / ox))
    } else {
        (oy, std::f32::consts::FRAC_PI_2 - std::f32::consts::FRAC_PI_4 * (ox / oy))
    };
    (r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_ray_points_down_forward_axis() {
        let cam = Camera::default();
        let rc = cam.extract_render_camera();
        let ray = rc.construct_camera_ray(Vec2::ZERO, Vec2::splat(0.5), 0, [550.0; 4], 0.0);
        assert!(ray.direction.dot(rc.forward) > 0.99);
    }

    #[test]
    fn pinhole_ray_is_deterministic_regardless_of_lens_uv() {
        let cam = Camera::default();
        let rc = cam.extract_render_camera();
        let a = rc.construct_camera_ray(Vec2::new(0.3, -0.2), Vec2::new(0.1, 0.9), 0, [550.0; 4], 0.0);
        let b = rc.construct_camera_ray(Vec2::new(0.3, -0.2), Vec2::new(0.9, 0.1), 0, [550.0; 4], 0.0);
        assert_eq!(a.direction, b.direction);
    }
}
