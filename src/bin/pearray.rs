//! `pearray` CLI entry point (§6), mirroring the original's frontend
//! binary: parse arguments, build a [`RenderSettings`] from them, load a
//! scene, drive a [`RenderContext`] to completion, and write the output
//! image.
//!
//! Scene description parsing is an external collaborator (§1) this crate
//! does not implement; until one is wired in, this binary renders a small
//! built-in furnace-test scene (§8 scenario 1) against whatever scene file
//! path was given, purely so the engine end to end (camera rays → shading
//! → output → image writer) has something real to exercise. A real
//! front end would replace [`demo_scene`] with the external loader's
//! output plus the camera/resolution it parses from the scene file.

use pearray::cli::{Args, ExitCode};
use pearray::config::RenderSettings;
use pearray::render::{write_output, InMemoryImage};
use pearray::scene::{
    Camera, ConstantEnvironmentLight, Entity, InfiniteLight, Mesh, SceneDatabase, SphereAreaLight,
    SurfaceHit, Traceable,
};
use pearray::shading::{DiffuseEmission, DiffuseMaterial, ShadingNode};
use pearray::spectral::SpectralBlob;
use clap::Parser;
use glam::Affine3A;
use std::process::ExitCode as ProcessExitCode;
use std::sync::Arc;

/// Single-sphere acceleration structure good enough to drive the built-in
/// demo scene; a real BVH over arbitrary meshes is out of scope (§1).
struct SphereTraceable {
    center: glam::Vec3,
    radius: f32,
    entity: pearray::scene::EntityId,
}

impl Traceable for SphereTraceable {
    fn intersect(&self, origin: [f32; 3], direction: [f32; 3], t_min: f32, t_max: f32) -> Option<SurfaceHit> {
        let o = glam::Vec3::from(origin) - self.center;
        let d = glam::Vec3::from(direction);
        let a = d.dot(d);
        let b = 2.0 * o.dot(d);
        let c = o.dot(o) - self.radius * self.radius;
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let t0 = (-b - sqrt_disc) / (2.0 * a);
        let t1 = (-b + sqrt_disc) / (2.0 * a);
        let t = if t0 > t_min && t0 < t_max {
            t0
        } else if t1 > t_min && t1 < t_max {
            t1
        } else {
            return None;
        };

        let p = glam::Vec3::from(origin) + d * t;
        let normal = (p - self.center).normalize();
        let (tangent, bitangent) = pearray::math::onb_from_normal(normal);
        Some(SurfaceHit {
            distance: t,
            entity: self.entity,
            primitive_id: 0,
            normal: normal.into(),
            geometric_normal: normal.into(),
            tangent: tangent.into(),
            bitangent: bitangent.into(),
            uvw: [0.0, 0.0, 0.0],
        })
    }
}

/// Builds the furnace-test scene (§8 scenario 1): a diffuse white sphere
/// inside a constant-radiance environment. Every pixel on the sphere
/// should converge near the environment's radiance value.
fn demo_scene(image_w: u32, image_h: u32) -> Arc<SceneDatabase> {
    let mut camera = Camera::default();
    camera.aspect = image_w as f32 / image_h.max(1) as f32;
    camera.world = Affine3A::IDENTITY;

    let mut db = SceneDatabase::new(camera);

    let white = db.nodes.insert(ShadingNode::ConstSpectral(SpectralBlob::splat(1.0)));
    let material = db.insert_material(Box::new(DiffuseMaterial::new(Some(white))));
    let mesh = db.meshes.insert(Mesh { name: "sphere".into(), triangle_count: 0 });

    let entity = db.insert_entity(Entity {
        mesh,
        material: Some(material),
        emission: None,
        light_sampler: Some(Arc::new(SphereAreaLight { center: glam::Vec3::new(0.0, 0.0, -3.0), radius: 1.0 })),
        name: "furnace_sphere".into(),
    });

    db.acceleration = Some(Arc::new(SphereTraceable { center: glam::Vec3::new(0.0, 0.0, -3.0), radius: 1.0, entity }));

    let env_emission = db.insert_emission(Box::new(DiffuseEmission::new(white, false)));
    db.infinite_lights.insert(InfiniteLight {
        emission: env_emission,
        sampler: Arc::new(ConstantEnvironmentLight { radiance: SpectralBlob::splat(1.0) }),
        name: "env".into(),
    });

    db.freeze();
    Arc::new(db)
}

fn run() -> pearray::Result<ProcessExitCode> {
    let args = Args::parse();

    if !args.scene.exists() {
        log::error!("scene file not found: {}", args.scene.display());
        return Ok(ProcessExitCode::from(ExitCode::IoFailure as u8));
    }

    log::info!("plugin search path: {:?}", args.resolved_plugin_paths());

    let settings = args.apply_to_settings(RenderSettings::default())?;

    const IMAGE_W: u32 = 64;
    const IMAGE_H: u32 = 64;
    let scene = demo_scene(IMAGE_W, IMAGE_H);
    let integrator = pearray::build_integrator(&settings);

    let mut ctx = pearray::RenderContext::new(scene, settings, integrator, IMAGE_W, IMAGE_H)?
        .with_observer(Box::new(pearray::render::LoggingObserver));

    match ctx.run() {
        Ok(()) => {}
        Err(pearray::PearRayError::Cancelled) => {
            log::warn!("render cancelled before completion");
            return Ok(ProcessExitCode::from(ExitCode::Cancelled as u8));
        }
        Err(e) => return Err(e),
    }

    let mut image = InMemoryImage::default();
    write_output(ctx.output(), &mut image)?;
    log::info!("rendered {}x{} image, {} channels", image.width, image.height, image.channels.len());

    Ok(ProcessExitCode::from(ExitCode::Success as u8))
}

fn main() -> ProcessExitCode {
    pearray::logging::init();
    match run() {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            ProcessExitCode::from(ExitCode::from_error(&e) as u8)
        }
    }
}
