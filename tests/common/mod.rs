//! Shared scene-building helpers for the end-to-end scenarios (§8). Every
//! scenario is built directly against `SceneDatabase` rather than through a
//! scene-file loader (out of scope, §1), using a small multi-sphere
//! acceleration structure standing in for a real BVH the way
//! `src/bin/pearray.rs`'s furnace demo does for a single sphere.

use glam::{Affine3A, Vec3};
use pearray::scene::{
    AreaLightSampler, Camera, ConstantEnvironmentLight, Entity, EntityId, InfiniteLight, Mesh,
    RectAreaLight, SceneDatabase, SphereAreaLight, SurfaceHit, Traceable,
};
use pearray::shading::{DiffuseEmission, DiffuseMaterial, MirrorMaterial, ShadingNode};
use pearray::spectral::SpectralBlob;
use std::sync::Arc;

/// One analytic sphere primitive bound to an entity id.
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub entity: EntityId,
}

/// Nearest-hit traversal over a handful of spheres — enough geometry for
/// every scenario below without needing a real mesh/BVH backend.
pub struct MultiSphereTraceable {
    pub spheres: Vec<Sphere>,
}

impl Traceable for MultiSphereTraceable {
    fn intersect(&self, origin: [f32; 3], direction: [f32; 3], t_min: f32, t_max: f32) -> Option<SurfaceHit> {
        let o = Vec3::from(origin);
        let d = Vec3::from(direction);
        let mut closest: Option<(f32, &Sphere)> = None;

        for sphere in &self.spheres {
            let oc = o - sphere.center;
            let a = d.dot(d);
            let b = 2.0 * oc.dot(d);
            let c = oc.dot(oc) - sphere.radius * sphere.radius;
            let disc = b * b - 4.0 * a * c;
            if disc < 0.0 {
                continue;
            }
            let sqrt_disc = disc.sqrt();
            let t0 = (-b - sqrt_disc) / (2.0 * a);
            let t1 = (-b + sqrt_disc) / (2.0 * a);
            let t = if t0 > t_min && t0 < t_max {
                t0
            } else if t1 > t_min && t1 < t_max {
                t1
            } else {
                continue;
            };
            if closest.is_none_or(|(best, _)| t < best) {
                closest = Some((t, sphere));
            }
        }

        let (t, sphere) = closest?;
        let p = o + d * t;
        let normal = (p - sphere.center).normalize();
        let (tangent, bitangent) = pearray::math::onb_from_normal(normal);
        Some(SurfaceHit {
            distance: t,
            entity: sphere.entity,
            primitive_id: 0,
            normal: normal.into(),
            geometric_normal: normal.into(),
            tangent: tangent.into(),
            bitangent: bitangent.into(),
            uvw: [0.0, 0.0, 0.0],
        })
    }
}

fn camera(image_w: u32, image_h: u32, position: Vec3) -> Camera {
    let mut camera = Camera::default();
    camera.aspect = image_w as f32 / image_h.max(1) as f32;
    camera.world = Affine3A::from_translation(position);
    camera
}

fn white_diffuse(db: &mut SceneDatabase) -> pearray::scene::MaterialId {
    let node = db.nodes.insert(ShadingNode::ConstSpectral(SpectralBlob::splat(1.0)));
    db.insert_material(Box::new(DiffuseMaterial::new(Some(node))))
}

fn tinted_diffuse(db: &mut SceneDatabase, rgb: [f32; 4]) -> pearray::scene::MaterialId {
    let node = db.nodes.insert(ShadingNode::ConstSpectral(SpectralBlob::from_array(rgb)));
    db.insert_material(Box::new(DiffuseMaterial::new(Some(node))))
}

/// Scenario 1 (§8): a diffuse white sphere inside a constant-radiance
/// environment. Every visible pixel should converge to the environment's
/// radiance regardless of which surface it hit.
pub fn furnace_scene(image_w: u32, image_h: u32) -> Arc<SceneDatabase> {
    let mut db = SceneDatabase::new(camera(image_w, image_h, Vec3::ZERO));

    let material = white_diffuse(&mut db);
    let mesh = db.meshes.insert(Mesh { name: "sphere".into(), triangle_count: 0 });
    let entity = db.insert_entity(Entity {
        mesh,
        material: Some(material),
        emission: None,
        light_sampler: Some(Arc::new(SphereAreaLight { center: Vec3::new(0.0, 0.0, -3.0), radius: 1.0 })),
        name: "sphere".into(),
    });

    db.acceleration = Some(Arc::new(MultiSphereTraceable {
        spheres: vec![Sphere { center: Vec3::new(0.0, 0.0, -3.0), radius: 1.0, entity }],
    }));

    let env_emission = db.insert_emission(Box::new(DiffuseEmission::new(
        db.nodes.insert(ShadingNode::ConstSpectral(SpectralBlob::splat(1.0))),
        false,
    )));
    db.infinite_lights.insert(InfiniteLight {
        emission: env_emission,
        sampler: Arc::new(ConstantEnvironmentLight { radiance: SpectralBlob::splat(1.0) }),
        name: "env".into(),
    });

    db.freeze();
    Arc::new(db)
}

/// A sphere-approximated Cornell box (scenario 2, §8): red/green walls
/// modeled as large spheres standing in for planes, a small ceiling area
/// light, and a diffuse sphere standing in for the cube. Large-radius
/// spheres keep the scene inside [`MultiSphereTraceable`] without a real
/// plane/mesh primitive.
pub fn cornell_scene(image_w: u32, image_h: u32) -> Arc<SceneDatabase> {
    let mut db = SceneDatabase::new(camera(image_w, image_h, Vec3::new(0.0, 0.0, 2.0)));

    const WALL_RADIUS: f32 = 1000.0;
    let red = tinted_diffuse(&mut db, [0.9, 0.05, 0.05, 0.05]);
    let green = tinted_diffuse(&mut db, [0.05, 0.9, 0.05, 0.05]);
    let white = white_diffuse(&mut db);

    let mesh = db.meshes.insert(Mesh { name: "wall".into(), triangle_count: 0 });
    let mut spheres = Vec::new();

    let left_wall = db.insert_entity(Entity { mesh, material: Some(red), emission: None, light_sampler: None, name: "left".into() });
    spheres.push(Sphere { center: Vec3::new(-(WALL_RADIUS + 2.0), 0.0, -4.0), radius: WALL_RADIUS, entity: left_wall });

    let right_wall = db.insert_entity(Entity { mesh, material: Some(green), emission: None, light_sampler: None, name: "right".into() });
    spheres.push(Sphere { center: Vec3::new(WALL_RADIUS + 2.0, 0.0, -4.0), radius: WALL_RADIUS, entity: right_wall });

    let floor = db.insert_entity(Entity { mesh, material: Some(white), emission: None, light_sampler: None, name: "floor".into() });
    spheres.push(Sphere { center: Vec3::new(0.0, -(WALL_RADIUS + 2.0), -4.0), radius: WALL_RADIUS, entity: floor });

    let back_wall = db.insert_entity(Entity { mesh, material: Some(white), emission: None, light_sampler: None, name: "back".into() });
    spheres.push(Sphere { center: Vec3::new(0.0, 0.0, -(WALL_RADIUS + 8.0)), radius: WALL_RADIUS, entity: back_wall });

    let cube = db.insert_entity(Entity { mesh, material: Some(white), emission: None, light_sampler: None, name: "cube".into() });
    spheres.push(Sphere { center: Vec3::new(0.0, -1.2, -4.0), radius: 0.6, entity: cube });

    let light_geometry = Arc::new(RectAreaLight {
        origin: Vec3::new(-0.3, 1.98, -4.3),
        edge_u: Vec3::new(0.6, 0.0, 0.0),
        edge_v: Vec3::new(0.0, 0.0, 0.6),
        normal: Vec3::new(0.0, -1.0, 0.0),
    });
    let light_material = white_diffuse(&mut db);
    let light_emission_node = db.nodes.insert(ShadingNode::ConstSpectral(SpectralBlob::splat(8.0)));
    let light_emission = db.insert_emission(Box::new(DiffuseEmission::new(light_emission_node, true)));
    let light = db.insert_entity(Entity {
        mesh,
        material: Some(light_material),
        emission: Some(light_emission),
        light_sampler: Some(light_geometry),
        name: "ceiling_light".into(),
    });
    spheres.push(Sphere { center: Vec3::new(0.0, WALL_RADIUS + 2.0, -4.0), radius: WALL_RADIUS, entity: light });

    db.acceleration = Some(Arc::new(MultiSphereTraceable { spheres }));
    db.freeze();
    Arc::new(db)
}

/// Scenario 3 (§8): a small area light sits above a mirror sphere, which
/// in turn sits above a diffuse floor. Direct light sampling alone can't
/// see most of the floor past the mirror, so floor radiance has to arrive
/// through the photon map's indirect gather across the specular bounce.
pub fn specular_focus_scene(image_w: u32, image_h: u32) -> Arc<SceneDatabase> {
    let mut db = SceneDatabase::new(camera(image_w, image_h, Vec3::new(0.0, 0.5, 1.0)));

    const FLOOR_RADIUS: f32 = 1000.0;
    let floor_material = white_diffuse(&mut db);
    let mesh = db.meshes.insert(Mesh { name: "floor".into(), triangle_count: 0 });
    let floor = db.insert_entity(Entity {
        mesh,
        material: Some(floor_material),
        emission: None,
        light_sampler: None,
        name: "floor".into(),
    });
    let mut spheres = vec![Sphere { center: Vec3::new(0.0, -(FLOOR_RADIUS + 1.0), -3.0), radius: FLOOR_RADIUS, entity: floor }];

    let mirror_node = db.nodes.insert(ShadingNode::ConstSpectral(SpectralBlob::splat(1.0)));
    let mirror_material = db.insert_material(Box::new(MirrorMaterial::new(Some(mirror_node))));
    let mirror = db.insert_entity(Entity {
        mesh,
        material: Some(mirror_material),
        emission: None,
        light_sampler: None,
        name: "mirror".into(),
    });
    spheres.push(Sphere { center: Vec3::new(0.0, 0.0, -3.0), radius: 0.5, entity: mirror });

    let light_material = white_diffuse(&mut db);
    let light_emission_node = db.nodes.insert(ShadingNode::ConstSpectral(SpectralBlob::splat(40.0)));
    let light_emission = db.insert_emission(Box::new(DiffuseEmission::new(light_emission_node, false)));
    let light_sampler = Arc::new(SphereAreaLight { center: Vec3::new(0.0, 2.5, -3.0), radius: 0.3 });
    let light = db.insert_entity(Entity {
        mesh,
        material: Some(light_material),
        emission: Some(light_emission),
        light_sampler: Some(light_sampler),
        name: "light".into(),
    });
    spheres.push(Sphere { center: Vec3::new(0.0, 2.5, -3.0), radius: 0.3, entity: light });

    db.acceleration = Some(Arc::new(MultiSphereTraceable { spheres }));
    db.freeze();
    Arc::new(db)
}

/// A uniform-emission scene with no geometry at all (scenario 5, §8): every
/// camera ray escapes straight to the constant environment, so the only
/// thing under test is the adaptive-stop bookkeeping, not shading.
pub fn uniform_environment_scene(image_w: u32, image_h: u32) -> Arc<SceneDatabase> {
    let mut db = SceneDatabase::new(camera(image_w, image_h, Vec3::ZERO));
    let env_emission_node = db.nodes.insert(ShadingNode::ConstSpectral(SpectralBlob::splat(1.0)));
    let env_emission = db.insert_emission(Box::new(DiffuseEmission::new(env_emission_node, false)));
    db.infinite_lights.insert(InfiniteLight {
        emission: env_emission,
        sampler: Arc::new(ConstantEnvironmentLight { radiance: SpectralBlob::splat(1.0) }),
        name: "env".into(),
    });
    db.freeze();
    Arc::new(db)
}
