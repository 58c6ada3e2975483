//! Bundle resolution core: computes which modules each section of a bundle
//! contains and in which order they have to be emitted.

pub mod config;
pub mod decomposition;
pub mod filter;
pub mod module_graph;
pub mod module_info;
pub mod module_registry;
pub mod resolved_bundle;
pub mod resolver;
pub mod section_resolver;
pub mod tracker;
pub mod types;

pub use module_info::{ModuleInfo, ModulePool, Resource};
pub use module_registry::ModuleRegistry;
pub use resolved_bundle::{ResolvedBundleDefinition, ResolvedSection};
pub use resolver::BundleResolver;
pub use types::{BundleDefinition, ModuleName, Section, SectionMode};
