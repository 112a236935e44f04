//! Spatial-hash photon map (component E, §4.5), grounded on the original's
//! `PhotonMap`/`PointMap`: a fixed grid of buckets keyed by
//! `floor((p - origin)/delta)`. Each bucket is a `parking_lot::RwLock<Vec<Photon>>`
//! (§5 "lock-free append during photon passes" relaxed to a per-bucket
//! reader-writer lock — see DESIGN.md for why): a bucket's *first* photon
//! takes a short write lock on the outer bucket table to insert the
//! bucket itself, every photon after that only locks its own bucket.
//! `gather()` only ever takes read locks and never mutates a bucket, so
//! unlike a pop/push queue it is safe to call from many worker threads at
//! once, which `ppm::PpmIntegrator::gather_update` relies on (§5, §8
//! deterministic replay).

use super::photon::Photon;
use crate::spectral::SpectralBlob;
use glam::Vec3;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Which side of the query normal photons must lie on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatherMode {
    Sphere,
    /// Only the hemisphere the normal faces; applies the ellipsoidal
    /// squeeze when `squeeze_weight < 1`.
    Dome,
}

#[derive(Debug, Clone, Copy)]
pub struct GatherQuery {
    pub center: Vec3,
    pub radius_sqr: f32,
    pub normal: Vec3,
    pub squeeze_weight: f32,
    pub mode: GatherMode,
    /// Cone-filter `K` (§4.5), normally `settings.ppm.cone_k`; the default
    /// used throughout the worked examples is `1.1`.
    pub cone_k: f32,
}

/// Default cone-filter `K` (§4.5), used only by tests that don't thread a
/// configured value through.
pub const DEFAULT_CONE_FILTER_K: f32 = 1.1;

#[must_use]
pub fn cone_filter_weight(dist_sqr: f32, radius_sqr: f32, k: f32) -> f32 {
    let w = (1.0 - dist_sqr / (k * radius_sqr)).max(0.0);
    let normalization = 1.0 / ((1.0 - 2.0 / (3.0 * k)) * std::f32::consts::PI * radius_sqr);
    w * normalization
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BucketKey {
    x: i32,
    y: i32,
    z: i32,
}

pub struct PhotonMap {
    origin: Vec3,
    inv_delta: f32,
    buckets: RwLock<FxHashMap<BucketKey, RwLock<Vec<Photon>>>>,
    stored: AtomicU64,
}

impl PhotonMap {
    /// `delta` should be chosen so that one gather radius covers at most
    /// 27 buckets (§4.5 grid pre-sizing note); callers typically set
    /// `delta = 2 * expected_gather_radius`.
    #[must_use]
    pub fn new(origin: Vec3, delta: f32) -> Self {
        Self {
            origin,
            inv_delta: 1.0 / delta,
            buckets: RwLock::new(FxHashMap::default()),
            stored: AtomicU64::new(0),
        }
    }

    fn key_for(&self, p: Vec3) -> BucketKey {
        let v = (p - self.origin) * self.inv_delta;
        BucketKey { x: v.x.floor() as i32, y: v.y.floor() as i32, z: v.z.floor() as i32 }
    }

    /// Safe to call from any number of tracing threads concurrently,
    /// including against other `store` calls targeting a different bucket;
    /// two `store` calls landing in the same bucket serialize on that
    /// bucket's own write lock. Never call concurrently with
    /// [`PhotonMap::gather`] (§5 "photon map buckets ... are only queried
    /// after a full barrier at pass end").
    pub fn store(&self, photon: Photon) {
        let key = self.key_for(photon.position);
        {
            let buckets = self.buckets.read();
            if let Some(bucket) = buckets.get(&key) {
                bucket.write().push(photon);
                self.stored.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        let mut buckets = self.buckets.write();
        buckets.entry(key).or_insert_with(|| RwLock::new(Vec::new())).write().push(photon);
        self.stored.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stored.load(Ordering::Relaxed) == 0
    }

    #[must_use]
    pub fn stored_photons(&self) -> u64 {
        self.stored.load(Ordering::Relaxed)
    }

    /// Walks the 3x3x3 neighborhood around the query center and accumulates
    /// contributions with `accum`, which receives each photon within the
    /// (possibly squeezed) radius and its cone-filter weight. Only ever
    /// takes read locks and never mutates a bucket, so concurrent calls
    /// from many worker threads — including calls whose 3x3x3
    /// neighborhoods overlap — see a stable, unmutated photon list and
    /// produce the same per-pixel counts regardless of scheduling (§5,
    /// §8 deterministic replay).
    pub fn gather(
        &self,
        query: &GatherQuery,
        mut accum: impl FnMut(&Photon, f32) -> SpectralBlob,
    ) -> (SpectralBlob, usize) {
        let center_key = self.key_for(query.center);
        let mut total = SpectralBlob::ZERO;
        let mut found = 0usize;
        let buckets = self.buckets.read();

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = BucketKey {
                        x: center_key.x + dx,
                        y: center_key.y + dy,
                        z: center_key.z + dz,
                    };
                    let Some(bucket) = buckets.get(&key) else { continue };
                    for photon in bucket.read().iter() {
                        if let Some(weight) = self.accept(photon, query) {
                            total += accum(photon, weight);
                            found += 1;
                        }
                    }
                }
            }
        }

        (total, found)
    }

    fn accept(&self, photon: &Photon, query: &GatherQuery) -> Option<f32> {
        let offset = photon.position - query.center;
        let dist_sqr = offset.length_squared();
        if dist_sqr > query.radius_sqr {
            return None;
        }

        match query.mode {
            GatherMode::Sphere => Some(cone_filter_weight(dist_sqr, query.radius_sqr, query.cone_k)),
            GatherMode::Dome => {
                let n_dot = offset.dot(query.normal);
                if n_dot < 0.0 {
                    return None;
                }
                let squeezed = if query.squeeze_weight < 1.0 {
                    dist_sqr + query.squeeze_weight * n_dot * n_dot
                } else {
                    dist_sqr
                };
                if squeezed > query.radius_sqr {
                    None
                } else {
                    Some(cone_filter_weight(squeezed, query.radius_sqr, query.cone_k))
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.buckets.get_mut().clear();
        *self.stored.get_mut() = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photon::photon::EncodedDirection;

    fn photon_at(p: Vec3) -> Photon {
        Photon {
            position: p,
            direction: EncodedDirection::encode(Vec3::Z),
            power: SpectralBlob::splat(1.0),
            flags: Default::default(),
        }
    }

    #[test]
    fn gather_finds_photons_within_radius() {
        let map = PhotonMap::new(Vec3::ZERO, 1.0);
        map.store(photon_at(Vec3::new(0.05, 0.0, 0.0)));
        map.store(photon_at(Vec3::new(5.0, 5.0, 5.0)));

        let query = GatherQuery {
            center: Vec3::ZERO,
            radius_sqr: 0.25,
            normal: Vec3::Z,
            squeeze_weight: 1.0,
            mode: GatherMode::Sphere,
            cone_k: DEFAULT_CONE_FILTER_K,
        };
        let (total, found) = map.gather(&query, |p, w| p.power * w);
        assert_eq!(found, 1);
        assert!(total.sum() > 0.0);
    }

    #[test]
    fn dome_mode_rejects_photons_behind_the_normal() {
        let map = PhotonMap::new(Vec3::ZERO, 1.0);
        map.store(photon_at(Vec3::new(0.0, 0.0, -0.05)));

        let query = GatherQuery {
            center: Vec3::ZERO,
            radius_sqr: 0.25,
            normal: Vec3::Z,
            squeeze_weight: 1.0,
            mode: GatherMode::Dome,
            cone_k: DEFAULT_CONE_FILTER_K,
        };
        let (_, found) = map.gather(&query, |p, w| p.power * w);
        assert_eq!(found, 0);
    }

    #[test]
    fn cone_filter_weight_is_zero_at_the_boundary() {
        let w = cone_filter_weight(1.0, 1.0 / DEFAULT_CONE_FILTER_K, DEFAULT_CONE_FILTER_K);
        assert!(w.abs() < 1e-4);
    }

    #[test]
    fn reset_clears_all_stored_photons() {
        let mut map = PhotonMap::new(Vec3::ZERO, 1.0);
        map.store(photon_at(Vec3::ZERO));
        assert!(!map.is_empty());
        map.reset();
        assert!(map.is_empty());
    }
}
