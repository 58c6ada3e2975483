//! In-memory module pool
//!
//! The ModuleRegistry is the reference [`ModulePool`] implementation: it keeps
//! every resource keyed by name in insertion order, which is also the order the
//! resolver fans out over.

use anyhow::{Result, anyhow};
use indexmap::IndexMap;
use rustc_hash::FxHasher;

use crate::{
    module_info::{ModuleInfo, ModulePool, Resource},
    types::ModuleName,
};

/// Type alias for FxHasher-based IndexMap
type FxIndexMap<K, V> = IndexMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Central registry for module information
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    resources: FxIndexMap<ModuleName, Resource>,
}

impl ModuleRegistry {
    /// Create a new empty module registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module to the registry, replacing any previous module of the same name
    pub fn add_module(&mut self, info: ModuleInfo) {
        let resource = Resource::new(info);
        self.resources.insert(resource.name.clone(), resource);
    }

    /// Builder-style variant of [`ModuleRegistry::add_module`]
    #[must_use]
    pub fn with_module(mut self, info: ModuleInfo) -> Self {
        self.add_module(info);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<ModuleInfo> for ModuleRegistry {
    fn from_iter<T: IntoIterator<Item = ModuleInfo>>(iter: T) -> Self {
        let mut registry = Self::new();
        for info in iter {
            registry.add_module(info);
        }
        registry
    }
}

impl ModulePool for ModuleRegistry {
    fn resources(&self) -> Vec<ModuleName> {
        self.resources.keys().cloned().collect()
    }

    fn find_resource(&self, name: &str) -> Result<&Resource> {
        self.resources
            .get(name)
            .ok_or_else(|| anyhow!("resource not found in pool: '{name}'"))
    }
}
