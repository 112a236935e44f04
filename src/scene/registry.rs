//! Plugin factory registry (component K), grounded on the original's
//! `AbstractManager<OBJ, FAC>`: a name-keyed table of factories used by a
//! scene loader to construct materials/emissions/shading nodes by their
//! registered type name. Only the lookup-by-name half of that pattern is in
//! scope here — loading shared-library plugins from disk is out of scope
//! (§1/§6), so factories are registered by the embedding application at
//! startup instead of discovered from `PR_PLUGIN_PATH` at runtime.

use crate::shading::{Emission, Material};
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no factory registered under name '{0}'")]
    UnknownFactory(String),
    #[error("factory '{0}' was registered more than once; replacing the previous one")]
    Shadowed(String),
}

type MaterialFactory = Box<dyn Fn(&[(String, String)]) -> Box<dyn Material> + Send + Sync>;
type EmissionFactory = Box<dyn Fn(&[(String, String)]) -> Box<dyn Emission> + Send + Sync>;

/// Name-keyed factory tables for the object kinds a scene loader needs to
/// construct. `Registry` itself never touches the filesystem; merging
/// `PR_PLUGIN_PATH` with a `--plugin-path` flag is the CLI's job
/// (`src/cli.rs`).
#[derive(Default)]
pub struct Registry {
    materials: FxHashMap<String, MaterialFactory>,
    emissions: FxHashMap<String, EmissionFactory>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a material factory under `name`, returning
    /// [`RegistryError::Shadowed`] (not a failure — the new factory still
    /// takes effect) if a factory was already registered under that name.
    pub fn register_material(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&[(String, String)]) -> Box<dyn Material> + Send + Sync + 'static,
    ) -> Option<RegistryError> {
        let name = name.into();
        let shadowed = self.materials.contains_key(&name).then(|| RegistryError::Shadowed(name.clone()));
        self.materials.insert(name, Box::new(factory));
        shadowed
    }

    pub fn register_emission(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&[(String, String)]) -> Box<dyn Emission> + Send + Sync + 'static,
    ) -> Option<RegistryError> {
        let name = name.into();
        let shadowed = self.emissions.contains_key(&name).then(|| RegistryError::Shadowed(name.clone()));
        self.emissions.insert(name, Box::new(factory));
        shadowed
    }

    pub fn construct_material(
        &self,
        name: &str,
        params: &[(String, String)],
    ) -> Result<Box<dyn Material>, RegistryError> {
        self.materials
            .get(name)
            .map(|factory| factory(params))
            .ok_or_else(|| RegistryError::UnknownFactory(name.to_string()))
    }

    pub fn construct_emission(
        &self,
        name: &str,
        params: &[(String, String)],
    ) -> Result<Box<dyn Emission>, RegistryError> {
        self.emissions
            .get(name)
            .map(|factory| factory(params))
            .ok_or_else(|| RegistryError::UnknownFactory(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::DiffuseMaterial;

    #[test]
    fn unregistered_name_reports_unknown_factory() {
        let reg = Registry::new();
        let err = reg.construct_material("diffuse", &[]).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownFactory(name) if name == "diffuse"));
    }

    #[test]
    fn registered_factory_constructs_on_demand() {
        let mut reg = Registry::new();
        assert!(reg.register_material("diffuse", |_| Box::new(DiffuseMaterial::new(None))).is_none());
        assert!(reg.construct_material("diffuse", &[]).is_ok());
    }

    #[test]
    fn re_registering_reports_shadowed_but_still_replaces() {
        let mut reg = Registry::new();
        reg.register_material("diffuse", |_| Box::new(DiffuseMaterial::new(None)));
        let shadowed = reg.register_material("diffuse", |_| Box::new(DiffuseMaterial::new(None)));
        assert!(matches!(shadowed, Some(RegistryError::Shadowed(_))));
    }
}
