//! Cache path/`needs_update` resolution (§6 "Cache layout"), grounded on
//! the original's resource manager: given a workdir and a stable name, this
//! resolves where a cached artifact *would* live and whether it is stale,
//! without touching the serialization format itself (mesh BVH blobs, node
//! parametric images — out of scope per §1).

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{PearRayError, Result};

/// The three cache groups named by §6's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheGroup {
    Mesh,
    Scene,
    Node,
}

impl CacheGroup {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::Scene => "scene",
            Self::Node => "node",
        }
    }
}

/// A resolved cache entry: where the artifact lives and whether it needs
/// rebuilding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub needs_update: bool,
}

/// Resolves `<workdir>/cache/<group>/<name><ext>` and creates the group
/// directory if missing (§6). `needs_update` is set if the file is absent
/// or any of `dependency_mtimes` is newer than the cache file's own mtime.
pub fn resolve(workdir: &Path, group: CacheGroup, name: &str, ext: &str, dependency_mtimes: &[SystemTime]) -> Result<CacheEntry> {
    let dir = workdir.join("cache").join(group.dir_name());
    std::fs::create_dir_all(&dir).map_err(|e| PearRayError::CachePath(format!("{}: {e}", dir.display())))?;

    let path = dir.join(format!("{name}{ext}"));
    let needs_update = match std::fs::metadata(&path).and_then(|m| m.modified()) {
        Ok(cached_mtime) => dependency_mtimes.iter().any(|dep| *dep > cached_mtime),
        Err(_) => true,
    };

    Ok(CacheEntry { path, needs_update })
}
