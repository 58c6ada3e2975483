//! Classification of resources into plain modules and bundles
//!
//! A resource that embeds sub-modules is a bundle. If at least one of those
//! sub-modules can be found in the pool on its own, the bundle is decomposable
//! and the resolver unpacks it into its sub-modules. Otherwise it is opaque and
//! the resolver keeps it whole, which means dropping it from the selection.

use log::trace;

use crate::{
    module_info::{ModuleInfo, ModulePool, Resource},
    types::ModuleName,
};

/// Library preload files list their sub-modules too, but are never unpacked
const LIBRARY_PRELOAD_SUFFIX: &str = "library.js";

/// Outcome of classifying a resource that was found in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleClassification<'a> {
    /// Ordinary module, selected with its info
    Plain(&'a ModuleInfo),
    /// Bundle whose sub-modules are resolved individually instead of the bundle
    DecomposableBundle(&'a [ModuleName]),
    /// Bundle with no resolvable sub-module
    OpaqueBundle(&'a [ModuleName]),
}

/// Classify `resource`, probing its sub-modules against `pool`
pub fn classify<'a, P: ModulePool + ?Sized>(
    pool: &P,
    resource: &'a Resource,
) -> ModuleClassification<'a> {
    let sub_modules = resource.info.sub_modules();
    if sub_modules.is_empty() || resource.name.ends_with(LIBRARY_PRELOAD_SUFFIX) {
        return ModuleClassification::Plain(&resource.info);
    }

    // One resolvable sub-module is enough: bundles are often only partially
    // mirrored in the current pool.
    if sub_modules
        .iter()
        .any(|sub_module| pool.find_resource(sub_module).is_ok())
    {
        trace!("{} is a decomposable bundle", resource.name);
        ModuleClassification::DecomposableBundle(sub_modules)
    } else {
        trace!("{} is an opaque bundle", resource.name);
        ModuleClassification::OpaqueBundle(sub_modules)
    }
}
