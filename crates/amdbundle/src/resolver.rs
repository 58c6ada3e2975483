use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use log::{debug, error};

use crate::{
    filter::ResourceFilterList,
    module_graph::topological_sort,
    module_info::ModulePool,
    resolved_bundle::{ResolvedBundleDefinition, ResolvedSection},
    section_resolver::{ResolutionContext, resolve_section},
    tracker::DependencyTracker,
    types::{BundleDefinition, ModuleName, Section, SectionMode},
};

/// Resolves bundle definitions against a module pool
///
/// The resolver itself is stateless: every call to [`BundleResolver::resolve`]
/// creates its own resolution context, so one resolver can serve any number of
/// bundles, one after another or from several threads.
#[derive(Debug)]
pub struct BundleResolver<'p, P: ?Sized> {
    pool: &'p P,
}

impl<'p, P: ModulePool + ?Sized> BundleResolver<'p, P> {
    pub fn new(pool: &'p P) -> Self {
        Self { pool }
    }

    /// Resolve every section of `bundle`, strictly in declaration order
    ///
    /// Modules that cannot be found are logged as errors and left out of the
    /// result. Only an unresolvable dependency cycle in a sorted section, an
    /// invalid filter or an unsupported section mode fails the resolution.
    pub fn resolve<'b>(
        &self,
        bundle: &'b BundleDefinition,
        tracker: Option<&mut dyn DependencyTracker>,
    ) -> Result<ResolvedBundleDefinition<'b>> {
        reject_unsupported_sections(bundle)?;

        let mut ctx = ResolutionContext::new(tracker);
        if let Some(tracker) = ctx.tracker() {
            tracker.start_resolution(bundle);
        }

        let mut sections = Vec::with_capacity(bundle.sections.len());
        for (index, section) in bundle.sections.iter().enumerate() {
            let filters = ResourceFilterList::new(&section.filters, section.file_types(bundle))
                .with_context(|| {
                    format!("Invalid filters in section {index} of bundle {}", bundle.name)
                })?;
            debug!(
                "Resolving section {index} ({}) of bundle {} with filters {filters}",
                section.mode, bundle.name
            );

            let modules = resolve_section(&mut ctx, self.pool, section, &filters);
            let modules = self.order_section(section, modules).with_context(|| {
                format!("Failed to order section {index} of bundle {}", bundle.name)
            })?;
            debug!("Section {index} of bundle {}: {modules:?}", bundle.name);

            sections.push(ResolvedSection {
                section_index: index,
                mode: section.mode,
                modules,
            });
        }

        let missing_modules = ctx.take_unforgiven_missing_modules();
        report_missing_modules(&bundle.name, &missing_modules);

        if let Some(tracker) = ctx.tracker() {
            tracker.end_resolution(bundle);
        }

        Ok(ResolvedBundleDefinition::new(bundle, sections, missing_modules))
    }

    fn order_section(
        &self,
        section: &Section,
        mut modules: Vec<ModuleName>,
    ) -> Result<Vec<ModuleName>> {
        match section.mode {
            SectionMode::Raw if section.sort => topological_sort(self.pool, &modules),
            SectionMode::BundleInfo => {
                modules.sort();
                Ok(modules)
            }
            _ => Ok(modules),
        }
    }
}

fn reject_unsupported_sections(bundle: &BundleDefinition) -> Result<()> {
    if let Some(index) = bundle
        .sections
        .iter()
        .position(|section| section.mode == SectionMode::Provided)
    {
        bail!(
            "Section {index} of bundle {} uses mode '{}', which is not supported",
            bundle.name,
            SectionMode::Provided
        );
    }
    Ok(())
}

fn report_missing_modules(bundle: &str, missing_modules: &BTreeMap<ModuleName, Vec<String>>) {
    if missing_modules.is_empty() {
        return;
    }
    error!(
        "{} module(s) could not be resolved for bundle {bundle}",
        missing_modules.len()
    );
    for messages in missing_modules.values() {
        for message in messages {
            error!("{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        module_info::ModuleInfo, module_registry::ModuleRegistry, tracker::RecordingTracker,
    };

    fn chain_pool() -> ModuleRegistry {
        ModuleRegistry::new()
            .with_module(ModuleInfo::new("a.js").with_dependencies(["b.js"]))
            .with_module(ModuleInfo::new("b.js").with_dependencies(["c.js"]))
            .with_module(ModuleInfo::new("c.js"))
    }

    #[test]
    fn test_raw_section_is_sorted_by_dependencies() {
        let pool = chain_pool();
        let bundle = BundleDefinition::new(
            "chain.js",
            vec![Section::new(SectionMode::Raw, ["a.js"]).resolving()],
        );

        let resolved = BundleResolver::new(&pool)
            .resolve(&bundle, None)
            .expect("acyclic bundle should resolve");
        assert_eq!(resolved.sections()[0].modules, ["c.js", "b.js", "a.js"]);
    }

    #[test]
    fn test_unsorted_raw_section_keeps_discovery_order() {
        let pool = chain_pool();
        let bundle = BundleDefinition::new(
            "chain.js",
            vec![Section::new(SectionMode::Raw, ["a.js"]).resolving().unsorted()],
        );

        let resolved = BundleResolver::new(&pool)
            .resolve(&bundle, None)
            .expect("unsorted section should resolve");
        assert_eq!(resolved.sections()[0].modules, ["a.js", "b.js", "c.js"]);
    }

    #[test]
    fn test_bundle_info_section_is_sorted_by_name() {
        let pool = ModuleRegistry::new()
            .with_module(ModuleInfo::new("z.js").with_dependencies(["m.js"]))
            .with_module(ModuleInfo::new("m.js"))
            .with_module(ModuleInfo::new("a.js"));
        let bundle = BundleDefinition::new(
            "info.js",
            vec![Section::new(SectionMode::BundleInfo, ["z.js", "a.js"]).resolving()],
        );

        let resolved = BundleResolver::new(&pool)
            .resolve(&bundle, None)
            .expect("bundle info section should resolve");
        assert_eq!(resolved.sections()[0].modules, ["a.js", "m.js", "z.js"]);
    }

    #[test]
    fn test_preload_section_keeps_discovery_order() {
        let pool = chain_pool();
        let bundle = BundleDefinition::new(
            "preload.js",
            vec![Section::new(SectionMode::Preload, ["a.js"]).resolving()],
        );

        let resolved = BundleResolver::new(&pool)
            .resolve(&bundle, None)
            .expect("preload section should resolve");
        assert_eq!(resolved.sections()[0].modules, ["a.js", "b.js", "c.js"]);
    }

    #[test]
    fn test_cycle_fails_the_bundle() {
        let pool = ModuleRegistry::new()
            .with_module(ModuleInfo::new("a.js").with_dependencies(["b.js"]))
            .with_module(ModuleInfo::new("b.js").with_dependencies(["a.js"]));
        let bundle = BundleDefinition::new(
            "cycle.js",
            vec![Section::new(SectionMode::Raw, ["a.js"]).resolving()],
        );

        let err = BundleResolver::new(&pool)
            .resolve(&bundle, None)
            .expect_err("cycle must fail the bundle");
        let message = format!("{err:#}");
        assert!(message.contains("a.js"), "{message}");
        assert!(message.contains("b.js"), "{message}");
        assert!(message.contains("section 0 of bundle cycle.js"), "{message}");
    }

    #[test]
    fn test_cycle_in_unsorted_section_is_tolerated() {
        let pool = ModuleRegistry::new()
            .with_module(ModuleInfo::new("a.js").with_dependencies(["b.js"]))
            .with_module(ModuleInfo::new("b.js").with_dependencies(["a.js"]));
        let bundle = BundleDefinition::new(
            "cycle.js",
            vec![Section::new(SectionMode::Preload, ["a.js"]).resolving()],
        );

        let resolved = BundleResolver::new(&pool)
            .resolve(&bundle, None)
            .expect("only sorted sections detect cycles");
        assert_eq!(resolved.sections()[0].modules, ["a.js", "b.js"]);
    }

    #[test]
    fn test_provided_sections_are_rejected_up_front() {
        let pool = chain_pool();
        let mut tracker = RecordingTracker::default();
        let bundle = BundleDefinition::new(
            "legacy.js",
            vec![
                Section::new(SectionMode::Raw, ["a.js"]),
                Section::new(SectionMode::Provided, ["other-bundle.js"]),
            ],
        );

        let err = BundleResolver::new(&pool)
            .resolve(&bundle, Some(&mut tracker))
            .expect_err("provided mode is unsupported");
        assert!(err.to_string().contains("'provided'"));
        assert!(tracker.events.is_empty());
    }

    #[test]
    fn test_missing_modules_are_reported_but_not_fatal() {
        let pool = ModuleRegistry::new()
            .with_module(ModuleInfo::new("b.js").with_dependencies(["gone.js"]))
            .with_module(ModuleInfo::new("a.js").with_dependencies(["gone.js", "lost.js"]));
        let bundle = BundleDefinition::new(
            "missing.js",
            vec![
                Section::new(SectionMode::Require, ["a.js"]).resolving(),
                Section::new(SectionMode::Require, ["b.js"]).resolving(),
            ],
        );

        let resolved = BundleResolver::new(&pool)
            .resolve(&bundle, None)
            .expect("missing modules are not fatal");
        assert_eq!(resolved.sections()[0].modules, ["a.js"]);
        assert_eq!(resolved.sections()[1].modules, ["b.js"]);

        let missing: Vec<(&str, Vec<&str>)> = resolved
            .missing_modules()
            .iter()
            .map(|(name, messages)| {
                (name.as_str(), messages.iter().map(String::as_str).collect())
            })
            .collect();
        assert_eq!(
            missing,
            vec![
                (
                    "gone.js",
                    vec![
                        "**** error: missing module gone.js, required by a.js",
                        "**** error: missing module gone.js, required by b.js",
                    ]
                ),
                (
                    "lost.js",
                    vec!["**** error: missing module lost.js, required by a.js"]
                ),
            ]
        );
    }

    #[test]
    fn test_tracker_brackets_the_resolution() {
        let pool = chain_pool();
        let mut tracker = RecordingTracker::default();
        let bundle = BundleDefinition::new(
            "tracked.js",
            vec![Section::new(SectionMode::Raw, ["c.js"])],
        );

        BundleResolver::new(&pool)
            .resolve(&bundle, Some(&mut tracker))
            .expect("bundle should resolve");
        assert_eq!(
            tracker.events,
            ["start tracked.js", "visit c.js", "end c.js", "finish tracked.js"]
        );
    }
}
