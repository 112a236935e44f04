//! In-memory scene graph (§4.x "Scene database").
//!
//! Scene description parsing lives outside this crate; this module only
//! defines the store the render engine traverses. Materials, emissions and
//! shading nodes are referenced by id rather than owned by the entities
//! that use them, so the graph has no cycles to worry about.

use crate::scene::camera::Camera;
use crate::scene::light::{AreaLightSampler, InfiniteLightSampler};
use crate::shading::{Emission, Material, ShadingNode};
use slotmap::{SlotMap, new_key_type};
use std::sync::Arc;

new_key_type! {
    pub struct EntityId;
    pub struct MaterialId;
    pub struct EmissionId;
    pub struct InfiniteLightId;
    pub struct MeshId;
    pub struct NodeId;
}

/// Shading nodes live here, addressed by [`NodeId`]; materials only ever
/// store the id, never the node itself (§9 "nodes live in an arena indexed
/// by id").
pub type NodeArena = SlotMap<NodeId, ShadingNode>;

/// Everything the stream pipeline needs from a ray/scene intersection to
/// build a [`crate::shading::ShadingContext`] (§4.8 "populates the hit
/// stream"). Geometry derivatives and the primitive's shading basis are
/// the acceleration structure's responsibility; this crate only consumes
/// them.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceHit {
    pub distance: f32,
    pub entity: EntityId,
    pub primitive_id: u32,
    pub normal: [f32; 3],
    pub geometric_normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub uvw: [f32; 3],
}

/// A mesh's BVH/traversal backend is an external collaborator (out of
/// scope); the engine only needs to cast a ray against *something*.
pub trait Traceable: Send + Sync {
    /// Nearest hit along `origin + t*direction` for `t` in `[t_min, t_max]`.
    fn intersect(&self, origin: [f32; 3], direction: [f32; 3], t_min: f32, t_max: f32)
        -> Option<SurfaceHit>;

    fn occluded(&self, origin: [f32; 3], direction: [f32; 3], t_min: f32, t_max: f32) -> bool {
        self.intersect(origin, direction, t_min, t_max).is_some()
    }
}

/// An instanced piece of geometry bound to a material/emission pair.
pub struct Entity {
    pub mesh: MeshId,
    pub material: Option<MaterialId>,
    pub emission: Option<EmissionId>,
    /// Area-sampling geometry for direct/bidirectional light sampling and
    /// PPM photon emission (§4.9); `None` for non-emissive entities.
    pub light_sampler: Option<Arc<dyn AreaLightSampler>>,
    pub name: String,
}

/// A light with no finite extent (environment map, distant/sun light).
pub struct InfiniteLight {
    pub emission: EmissionId,
    pub sampler: Arc<dyn InfiniteLightSampler>,
    pub name: String,
}

/// Opaque placeholder for a loaded triangle mesh; geometry loading is out
/// of scope, so this only tracks enough to report stats and key the
/// `Traceable` the caller supplies separately.
pub struct Mesh {
    pub name: String,
    pub triangle_count: u32,
}

/// The whole in-memory graph a render pass traverses.
pub struct SceneDatabase {
    pub entities: SlotMap<EntityId, Entity>,
    pub materials: SlotMap<MaterialId, Box<dyn Material>>,
    pub emissions: SlotMap<EmissionId, Box<dyn Emission>>,
    pub infinite_lights: SlotMap<InfiniteLightId, InfiniteLight>,
    pub meshes: SlotMap<MeshId, Mesh>,
    pub nodes: SlotMap<NodeId, ShadingNode>,
    pub camera: Camera,
    /// BVH or other acceleration structure; owned externally, shared across
    /// render threads.
    pub acceleration: Option<Arc<dyn Traceable>>,
}

impl SceneDatabase {
    #[must_use]
    pub fn new(camera: Camera) -> Self {
        Self {
            entities: SlotMap::with_key(),
            materials: SlotMap::with_key(),
            emissions: SlotMap::with_key(),
            infinite_lights: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            nodes: SlotMap::with_key(),
            camera,
            acceleration: None,
        }
    }

    pub fn insert_entity(&mut self, entity: Entity) -> EntityId {
        self.entities.insert(entity)
    }

    pub fn insert_material(&mut self, material: Box<dyn Material>) -> MaterialId {
        self.materials.insert(material)
    }

    pub fn insert_emission(&mut self, emission: Box<dyn Emission>) -> EmissionId {
        self.emissions.insert(emission)
    }

    #[must_use]
    pub fn material(&self, id: MaterialId) -> Option<&dyn Material> {
        self.materials.get(id).map(std::convert::AsRef::as_ref)
    }

    #[must_use]
    pub fn emission(&self, id: EmissionId) -> Option<&dyn Emission> {
        self.emissions.get(id).map(std::convert::AsRef::as_ref)
    }

    /// Called once all entities/materials/emissions/nodes are inserted;
    /// freezes every material and emission so render threads can share
    /// `&SceneDatabase` without interior mutability (§5 "Materials,
    /// emissions, and nodes must be immutable after `freeze()`").
    pub fn freeze(&mut self) {
        for (_, material) in &mut self.materials {
            material.freeze();
        }
        for (_, emission) in &mut self.emissions {
            emission.freeze();
        }
    }
}
