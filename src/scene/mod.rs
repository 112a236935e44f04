//! Scene database and camera (§4.x "Scene database", component K registry).
//!
//! Scene description *parsing* is out of scope; this module only defines
//! the in-memory graph the render engine traverses once a loader has
//! populated it, plus the plugin-factory lookup (`registry`) that loader
//! would use to construct materials/emissions from named types.

pub mod camera;
pub mod database;
pub mod light;
pub mod registry;

pub use camera::{Camera, ProjectionType, RenderCamera};
pub use database::{
    Entity, EntityId, EmissionId, InfiniteLight, InfiniteLightId, Mesh, MeshId, MaterialId,
    NodeArena, NodeId, SceneDatabase, SurfaceHit, Traceable,
};
pub use light::{
    AreaLightSample, AreaLightSampler, ConstantEnvironmentLight, InfiniteLightSample,
    InfiniteLightSampler, RectAreaLight, SphereAreaLight,
};
pub use registry::{Registry, RegistryError};
