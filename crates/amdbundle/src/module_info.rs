//! Module metadata and the pool interface the resolver consumes
//!
//! The static analysis that produces [`ModuleInfo`] lives outside this crate;
//! the resolver only ever reads it through the [`ModulePool`] trait.

use anyhow::Result;
use indexmap::IndexMap;

use crate::types::ModuleName;

/// Statically known facts about one module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    name: ModuleName,
    /// Dependency name -> whether it is only loaded conditionally
    dependencies: IndexMap<ModuleName, bool>,
    /// Modules embedded in this resource when it is a bundle
    sub_modules: Vec<ModuleName>,
}

impl ModuleInfo {
    pub fn new(name: impl Into<ModuleName>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record a dependency. An unconditional reference wins over a conditional one.
    pub fn add_dependency(&mut self, dependency: impl Into<ModuleName>, conditional: bool) {
        self.dependencies
            .entry(dependency.into())
            .and_modify(|existing| *existing &= conditional)
            .or_insert(conditional);
    }

    pub fn add_sub_module(&mut self, sub_module: impl Into<ModuleName>) {
        let sub_module = sub_module.into();
        if !self.sub_modules.contains(&sub_module) {
            self.sub_modules.push(sub_module);
        }
    }

    #[must_use]
    pub fn with_dependencies<S: Into<ModuleName>>(
        mut self,
        dependencies: impl IntoIterator<Item = S>,
    ) -> Self {
        for dependency in dependencies {
            self.add_dependency(dependency, false);
        }
        self
    }

    #[must_use]
    pub fn with_conditional_dependencies<S: Into<ModuleName>>(
        mut self,
        dependencies: impl IntoIterator<Item = S>,
    ) -> Self {
        for dependency in dependencies {
            self.add_dependency(dependency, true);
        }
        self
    }

    #[must_use]
    pub fn with_sub_modules<S: Into<ModuleName>>(
        mut self,
        sub_modules: impl IntoIterator<Item = S>,
    ) -> Self {
        for sub_module in sub_modules {
            self.add_sub_module(sub_module);
        }
        self
    }

    /// Dependencies in declaration order
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }

    pub fn is_conditional_dependency(&self, dependency: &str) -> bool {
        self.dependencies
            .get(dependency)
            .copied()
            .unwrap_or(false)
    }

    pub fn sub_modules(&self) -> &[ModuleName] {
        &self.sub_modules
    }
}

/// A module stored in a pool together with its analyzed info
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: ModuleName,
    pub info: ModuleInfo,
}

impl Resource {
    pub fn new(info: ModuleInfo) -> Self {
        Self {
            name: info.name().to_owned(),
            info,
        }
    }
}

impl From<ModuleInfo> for Resource {
    fn from(info: ModuleInfo) -> Self {
        Self::new(info)
    }
}

/// Storage layer the resolver looks modules up in
///
/// Lookups fail with an error for unknown names; the resolver treats such a
/// failure as "module absent" and never propagates it.
pub trait ModulePool {
    /// Names of every module known to the pool, in a stable order
    fn resources(&self) -> Vec<ModuleName>;

    /// Probe for a resource without requiring its analysis
    fn find_resource(&self, name: &str) -> Result<&Resource>;

    /// Look up a resource whose module info is available
    fn find_resource_with_info(&self, name: &str) -> Result<&Resource> {
        self.find_resource(name)
    }

    fn get_module_info(&self, name: &str) -> Result<&ModuleInfo> {
        self.find_resource_with_info(name)
            .map(|resource| &resource.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconditional_reference_wins() {
        let mut info = ModuleInfo::new("a.js");
        info.add_dependency("b.js", true);
        info.add_dependency("c.js", true);
        info.add_dependency("b.js", false);
        info.add_dependency("c.js", true);

        assert!(!info.is_conditional_dependency("b.js"));
        assert!(info.is_conditional_dependency("c.js"));
        assert!(!info.is_conditional_dependency("unknown.js"));
        assert_eq!(info.dependencies().collect::<Vec<_>>(), ["b.js", "c.js"]);
    }

    #[test]
    fn test_sub_modules_are_deduplicated() {
        let info = ModuleInfo::new("bndl.js").with_sub_modules(["x.js", "y.js", "x.js"]);
        assert_eq!(info.sub_modules(), ["x.js".to_owned(), "y.js".to_owned()]);
    }
}
