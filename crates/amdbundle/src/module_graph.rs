//! Dependency ordering for resolved module lists
//!
//! The graph is built per sort call and only contains the names being sorted:
//! a dependency on a module outside the list does not constrain the order.
//! Sorting repeatedly sweeps the remaining names in their original order and
//! emits every module whose in-list dependencies have all been emitted, which
//! keeps the result stable for identical input.

use anyhow::{Result, bail};
use log::{debug, trace, warn};
use petgraph::{
    Direction,
    stable_graph::{NodeIndex, StableDiGraph},
};
use rustc_hash::FxHashMap;

use crate::{module_info::ModulePool, types::ModuleName};

/// Graph over a fixed list of module names; an edge `a -> b` means `a` depends on `b`
#[derive(Debug)]
pub struct ModuleGraph<'n> {
    graph: StableDiGraph<&'n str, ()>,
    node_indices: FxHashMap<&'n str, NodeIndex>,
}

impl<'n> ModuleGraph<'n> {
    /// Build the graph for `names`, reading dependencies from `pool`
    ///
    /// Conditional dependencies never become edges. A name whose info cannot be
    /// looked up is kept as a node without dependencies.
    pub fn build<P: ModulePool + ?Sized>(pool: &P, names: &'n [ModuleName]) -> Self {
        let mut graph = StableDiGraph::with_capacity(names.len(), names.len());
        let mut node_indices = FxHashMap::default();
        for name in names {
            node_indices
                .entry(name.as_str())
                .or_insert_with(|| graph.add_node(name.as_str()));
        }

        for name in names {
            let info = match pool.get_module_info(name) {
                Ok(info) => info,
                Err(err) => {
                    warn!("Ignoring dependencies of {name} while sorting: {err:#}");
                    continue;
                }
            };
            let from = node_indices[name.as_str()];
            for dependency in info.dependencies() {
                if info.is_conditional_dependency(dependency) {
                    continue;
                }
                if let Some(&to) = node_indices.get(dependency) {
                    graph.update_edge(from, to, ());
                }
            }
        }

        Self {
            graph,
            node_indices,
        }
    }

    /// Names this module depends on within the graph
    pub fn dependencies_of(&self, name: &str) -> Vec<&'n str> {
        self.node_indices
            .get(name)
            .map(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .map(|dep| self.graph[dep])
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Consume the graph and order `names` so that dependencies come first
    ///
    /// Fails when a sweep makes no progress; the error names every module that
    /// could not be placed.
    pub fn into_sorted(mut self, names: &'n [ModuleName]) -> Result<Vec<ModuleName>> {
        let mut remaining: Vec<&'n str> = names.iter().map(String::as_str).collect();
        let mut sorted = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let before = remaining.len();
            remaining.retain(|&name| {
                let Some(&idx) = self.node_indices.get(name) else {
                    sorted.push(name.to_owned());
                    return false;
                };
                if !self.graph.contains_node(idx) {
                    // Duplicate entry for a module that was already emitted
                    return false;
                }
                if self
                    .graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_some()
                {
                    return true;
                }
                trace!("emit {name}");
                self.graph.remove_node(idx);
                sorted.push(name.to_owned());
                false
            });

            if remaining.len() == before {
                bail!(
                    "failed to resolve cyclic dependencies: {}",
                    remaining.join(", ")
                );
            }
        }

        Ok(sorted)
    }
}

/// Order `names` by their in-list, non-conditional dependencies
pub fn topological_sort<P: ModulePool + ?Sized>(
    pool: &P,
    names: &[ModuleName],
) -> Result<Vec<ModuleName>> {
    let graph = ModuleGraph::build(pool, names);
    debug!(
        "Sorting {} modules with {} dependency edges",
        names.len(),
        graph.edge_count()
    );
    graph.into_sorted(names)
}
