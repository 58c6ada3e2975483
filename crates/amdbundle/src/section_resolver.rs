//! Per-section dependency closure
//!
//! Every pool module is offered to the section's filters. Accepted modules are
//! visited once per scope; plain modules are selected and, when the section
//! asks for it, their dependencies and renderers are visited in turn.
//! Decomposable bundles are replaced by their sub-modules, opaque bundles are
//! dropped and their sub-modules are exempted from missing-module reporting.

use std::{collections::BTreeMap, mem};

use indexmap::IndexSet;
use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::{
    decomposition::{ModuleClassification, classify},
    filter::ModuleFilter,
    module_info::{ModulePool, Resource},
    tracker::DependencyTracker,
    types::{ModuleName, Section, SectionScope},
};

/// Mutable state of one bundle resolution, shared by all of its sections
pub struct ResolutionContext<'t> {
    visited: FxHashSet<ModuleName>,
    /// Selected modules in discovery order
    selected: IndexSet<ModuleName>,
    missing_modules: BTreeMap<ModuleName, Vec<String>>,
    /// Sub-modules of bundles; never reported as missing
    included_modules: FxHashSet<ModuleName>,
    tracker: Option<&'t mut dyn DependencyTracker>,
}

impl std::fmt::Debug for ResolutionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("visited", &self.visited)
            .field("selected", &self.selected)
            .field("missing_modules", &self.missing_modules)
            .field("included_modules", &self.included_modules)
            .field("tracker", &self.tracker.is_some())
            .finish()
    }
}

impl<'t> ResolutionContext<'t> {
    pub fn new(tracker: Option<&'t mut dyn DependencyTracker>) -> Self {
        Self {
            visited: FxHashSet::default(),
            selected: IndexSet::new(),
            missing_modules: BTreeMap::new(),
            included_modules: FxHashSet::default(),
            tracker,
        }
    }

    pub fn is_visited(&self, name: &str) -> bool {
        self.visited.contains(name)
    }

    pub fn selected(&self) -> &IndexSet<ModuleName> {
        &self.selected
    }

    pub fn missing_modules(&self) -> &BTreeMap<ModuleName, Vec<String>> {
        &self.missing_modules
    }

    pub fn included_modules(&self) -> &FxHashSet<ModuleName> {
        &self.included_modules
    }

    pub(crate) fn tracker(&mut self) -> Option<&mut (dyn DependencyTracker + 't)> {
        self.tracker.as_deref_mut()
    }

    /// Drop every missing module that a bundle vouched for and hand out the rest
    pub(crate) fn take_unforgiven_missing_modules(&mut self) -> BTreeMap<ModuleName, Vec<String>> {
        let mut missing = mem::take(&mut self.missing_modules);
        missing.retain(|name, messages| {
            if self.included_modules.contains(name) {
                debug!("Ignoring missing module {name}, it is contained in a bundle: {messages:?}");
                false
            } else {
                messages.sort();
                true
            }
        });
        missing
    }

    fn record_missing(&mut self, name: &str, message: String) {
        self.missing_modules
            .entry(name.to_owned())
            .or_default()
            .push(message);
    }
}

/// Conventional renderer of a control module: `Button.js` -> `ButtonRenderer.js`
pub fn renderer_name(module: &str) -> Option<String> {
    module
        .strip_suffix(".js")
        .map(|stem| format!("{stem}Renderer.js"))
}

/// Resolve one section against `pool`, returning its modules in discovery order
///
/// Isolated sections run on a cleared selection that is restored afterwards and
/// return everything they selected. Accumulating sections continue the shared
/// selection and return only what they appended to it.
pub fn resolve_section<P, F>(
    ctx: &mut ResolutionContext<'_>,
    pool: &P,
    section: &Section,
    filters: &F,
) -> Vec<ModuleName>
where
    P: ModulePool + ?Sized,
    F: ModuleFilter + ?Sized,
{
    match section.mode.scope() {
        SectionScope::Isolated => {
            let stashed_visited = mem::take(&mut ctx.visited);
            let stashed_selected = mem::take(&mut ctx.selected);

            SectionWalk::new(ctx, pool, section, filters).run();

            ctx.visited = stashed_visited;
            let selected = mem::replace(&mut ctx.selected, stashed_selected);
            selected.into_iter().collect()
        }
        SectionScope::Accumulating => {
            let start = ctx.selected.len();

            SectionWalk::new(ctx, pool, section, filters).run();

            ctx.selected.iter().skip(start).cloned().collect()
        }
    }
}

/// Pending work of a section walk
///
/// Dependency chains can be arbitrarily deep, so the walk keeps its own stack
/// instead of recursing. `Leave` is pushed below a module's children and pops
/// once all of them are done.
#[derive(Debug)]
enum Step {
    Visit {
        name: ModuleName,
        depth: usize,
        missing_message: Option<String>,
    },
    Leave(ModuleName),
}

struct SectionWalk<'w, 't, P: ?Sized, F: ?Sized> {
    ctx: &'w mut ResolutionContext<'t>,
    pool: &'w P,
    section: &'w Section,
    filters: &'w F,
    pending: Vec<Step>,
}

impl<'w, 't, P, F> SectionWalk<'w, 't, P, F>
where
    P: ModulePool + ?Sized,
    F: ModuleFilter + ?Sized,
{
    fn new(
        ctx: &'w mut ResolutionContext<'t>,
        pool: &'w P,
        section: &'w Section,
        filters: &'w F,
    ) -> Self {
        Self {
            ctx,
            pool,
            section,
            filters,
            pending: Vec::new(),
        }
    }

    fn run(&mut self) {
        for name in self.pool.resources() {
            self.pending.push(Step::Visit {
                name,
                depth: 0,
                missing_message: None,
            });
            while let Some(step) = self.pending.pop() {
                match step {
                    Step::Visit {
                        name,
                        depth,
                        missing_message,
                    } => self.check_and_add(name, depth, missing_message),
                    Step::Leave(name) => {
                        if let Some(tracker) = self.ctx.tracker() {
                            tracker.end_visit_dependency(&name);
                        }
                    }
                }
            }
        }
    }

    /// Visit `name` unless it was already visited or the filters reject it
    ///
    /// `missing_message` is recorded when the lookup fails; pool members and
    /// renderers are probed without one.
    fn check_and_add(&mut self, name: ModuleName, depth: usize, missing_message: Option<String>) {
        if self.ctx.visited.contains(&name) {
            if let Some(tracker) = self.ctx.tracker() {
                tracker.visit_dependency_again(&name);
            }
            return;
        }
        if !self.filters.matches(&name, depth > 0) {
            return;
        }

        self.ctx.visited.insert(name.clone());
        if let Some(tracker) = self.ctx.tracker() {
            tracker.visit_dependency(&name);
        }

        let pool = self.pool;
        match pool.find_resource_with_info(&name) {
            Ok(resource) => {
                self.pending.push(Step::Leave(name));
                self.add_resource(resource, depth);
            }
            Err(err) => {
                trace!("{name} is not available: {err:#}");
                if let Some(message) = missing_message {
                    self.ctx.record_missing(&name, message);
                }
                self.pending.push(Step::Leave(name));
            }
        }
    }

    /// Queue the children of a found resource so they pop in declaration order
    fn add_resource(&mut self, resource: &'w Resource, depth: usize) {
        let mut children = Vec::new();
        match classify(self.pool, resource) {
            ModuleClassification::DecomposableBundle(sub_modules) => {
                debug!("Decomposing bundle {}", resource.name);
                for sub_module in sub_modules {
                    self.ctx.included_modules.insert(sub_module.clone());
                    children.push(Step::Visit {
                        name: sub_module.clone(),
                        depth: depth + 1,
                        missing_message: Some(format!(
                            "**** error: missing submodule {sub_module}, included by {}",
                            resource.name
                        )),
                    });
                }
            }
            ModuleClassification::OpaqueBundle(sub_modules) => {
                // Kept whole, which leaves it out of the selection entirely
                debug!(
                    "Bundle {} has no resolvable sub-module, skipping it",
                    resource.name
                );
                self.ctx
                    .included_modules
                    .extend(sub_modules.iter().cloned());
            }
            ModuleClassification::Plain(info) => {
                self.ctx.selected.insert(resource.name.clone());

                if self.section.resolve {
                    for dependency in info.dependencies() {
                        if !self.section.resolve_conditional
                            && info.is_conditional_dependency(dependency)
                        {
                            trace!("Skipping conditional dependency {dependency} of {}", resource.name);
                            continue;
                        }
                        children.push(Step::Visit {
                            name: dependency.to_owned(),
                            depth: depth + 1,
                            missing_message: Some(format!(
                                "**** error: missing module {dependency}, required by {}",
                                resource.name
                            )),
                        });
                    }
                }

                if self.section.renderer
                    && let Some(renderer) = renderer_name(&resource.name)
                {
                    children.push(Step::Visit {
                        name: renderer,
                        depth: depth + 1,
                        missing_message: None,
                    });
                }
            }
        }
        self.pending.extend(children.into_iter().rev());
    }
}
