//! MIS weighting and direction-sampling projections (component D, §4.3).

pub mod mis;
pub mod projection;
pub mod reflection;

pub use mis::{balance_weight, power_weight, to_area, to_solid_angle, MisAccumulator};
pub use projection::{
    cosine_hemisphere, onb_from_normal, phong_hemisphere, to_world, uniform_hemisphere,
    uniform_sphere, uniform_triangle, DirectionSample,
};
pub use reflection::{fresnel_schlick, reflect, refract, refraction_angle};
