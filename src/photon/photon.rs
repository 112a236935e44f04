//! Stored photon record, grounded on `PointMap`'s `mapDirection`/
//! `evalDirection` byte-encoded direction cache.

use crate::spectral::SpectralBlob;
use glam::Vec3;

/// Incoming direction packed into two octahedral bytes (§4.5), trading a
/// few bits of angular precision for an 8x smaller footprint per stored
/// photon than a raw `Vec3`. Maps the unit sphere to the octahedron's
/// unfolded `[-1, 1]^2` square, folding the lower hemisphere's four
/// triangles over the upper ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedDirection {
    pub x: u8,
    pub y: u8,
}

impl EncodedDirection {
    #[must_use]
    pub fn encode(dir: Vec3) -> Self {
        let dir = dir.normalize();
        let l1 = dir.x.abs() + dir.y.abs() + dir.z.abs();
        let mut p = glam::Vec2::new(dir.x, dir.y) / l1.max(1e-12);
        if dir.z < 0.0 {
            let wrapped = glam::Vec2::new(1.0 - p.y.abs(), 1.0 - p.x.abs());
            p = glam::Vec2::new(
                if p.x >= 0.0 { wrapped.x } else { -wrapped.x },
                if p.y >= 0.0 { wrapped.y } else { -wrapped.y },
            );
        }
        let quantize = |v: f32| ((v * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { x: quantize(p.x), y: quantize(p.y) }
    }

    #[must_use]
    pub fn decode(self) -> Vec3 {
        let unquantize = |b: u8| f32::from(b) / 255.0 * 2.0 - 1.0;
        let (fx, fy) = (unquantize(self.x), unquantize(self.y));
        let z = 1.0 - fx.abs() - fy.abs();
        let t = (-z).max(0.0);
        let x = if fx >= 0.0 { fx - t } else { fx + t };
        let y = if fy >= 0.0 { fy - t } else { fy + t };
        Vec3::new(x, y, z).normalize()
    }
}

/// Two bytes of per-photon bookkeeping (§4.5): the diffuse bounce depth
/// at deposit (`0` for the first bounce off a light, saturating at
/// `u8::MAX`) and a reserved byte kept for future photon tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhotonFlags {
    pub bounce_depth: u8,
    pub reserved: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct Photon {
    pub position: Vec3,
    pub direction: EncodedDirection,
    pub power: SpectralBlob,
    pub flags: PhotonFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trips_within_quantization_error() {
        let dir = Vec3::new(0.3, 0.6, 0.742).normalize();
        let decoded = EncodedDirection::encode(dir).decode();
        assert!(dir.dot(decoded) > 0.99);
    }

    #[test]
    fn pole_directions_round_trip() {
        let decoded = EncodedDirection::encode(Vec3::Z).decode();
        assert!(decoded.dot(Vec3::Z) > 0.99);
    }
}
