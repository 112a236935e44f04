//! Photon map (component E, §4.5).

pub mod map;
pub mod photon;

pub use map::{cone_filter_weight, GatherMode, GatherQuery, PhotonMap};
pub use photon::{EncodedDirection, Photon, PhotonFlags};
