//! TOML configuration: bundle definitions and module manifests
//!
//! A bundle configuration lists bundles and their sections:
//!
//! ```toml
//! [[bundle]]
//! name = "app/Component-preload.js"
//!
//! [[bundle.section]]
//! mode = "preload"
//! filters = ["app/", "!app/test/"]
//! resolve = true
//! ```
//!
//! A module manifest carries the analysis results the pool is built from:
//!
//! ```toml
//! [[module]]
//! name = "app/Component.js"
//! dependencies = ["sap/ui/core/UIComponent.js"]
//! conditional-dependencies = ["app/lazy/Helper.js"]
//! ```

use std::{fs, path::Path};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;

use crate::{
    module_info::ModuleInfo,
    module_registry::ModuleRegistry,
    types::{BundleDefinition, ModuleName},
};

/// Bundle configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, rename = "bundle")]
    pub bundles: Vec<BundleDefinition>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read bundle configuration {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid bundle configuration {}", path.display()))?;
        debug!("Loaded {} bundle definition(s) from {}", config.bundles.len(), path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn bundle(&self, name: &str) -> Option<&BundleDefinition> {
        self.bundles.iter().find(|bundle| bundle.name == name)
    }
}

/// One analyzed module as stored in a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ModuleEntry {
    pub name: ModuleName,
    #[serde(default)]
    pub dependencies: Vec<ModuleName>,
    #[serde(default)]
    pub conditional_dependencies: Vec<ModuleName>,
    #[serde(default)]
    pub sub_modules: Vec<ModuleName>,
}

impl From<ModuleEntry> for ModuleInfo {
    fn from(entry: ModuleEntry) -> Self {
        Self::new(entry.name)
            .with_dependencies(entry.dependencies)
            .with_conditional_dependencies(entry.conditional_dependencies)
            .with_sub_modules(entry.sub_modules)
    }
}

/// Module manifest file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleManifest {
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleEntry>,
}

impl ModuleManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read module manifest {}", path.display()))?;
        let manifest = Self::parse(&content)
            .with_context(|| format!("Invalid module manifest {}", path.display()))?;
        debug!("Loaded {} module(s) from {}", manifest.modules.len(), path.display());
        Ok(manifest)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build the pool; a module listed twice keeps its last entry
    pub fn into_registry(self) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        for entry in self.modules {
            if registry.contains(&entry.name) {
                warn!("Module {} is listed more than once, keeping the last entry", entry.name);
            }
            registry.add_module(ModuleInfo::from(entry));
        }
        registry
    }
}
