//! Result of resolving a bundle definition
//!
//! Sections are positionally aligned with the definition they came from, so a
//! writer can zip the two lists when serializing the bundle.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{BundleDefinition, ModuleName, Section, SectionMode};

/// Modules selected for one section, in emission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedSection {
    pub section_index: usize,
    pub mode: SectionMode,
    pub modules: Vec<ModuleName>,
}

/// A bundle definition together with the modules resolved for each of its sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedBundleDefinition<'a> {
    #[serde(skip)]
    definition: &'a BundleDefinition,
    name: &'a str,
    sections: Vec<ResolvedSection>,
    /// Unresolvable modules with their sorted diagnostics; already reported as errors
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    missing_modules: BTreeMap<ModuleName, Vec<String>>,
}

impl<'a> ResolvedBundleDefinition<'a> {
    pub(crate) fn new(
        definition: &'a BundleDefinition,
        sections: Vec<ResolvedSection>,
        missing_modules: BTreeMap<ModuleName, Vec<String>>,
    ) -> Self {
        Self {
            definition,
            name: &definition.name,
            sections,
            missing_modules,
        }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn sections(&self) -> &[ResolvedSection] {
        &self.sections
    }

    /// Definition and resolution of every section, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&'a Section, &ResolvedSection)> {
        self.definition.sections.iter().zip(&self.sections)
    }

    pub fn modules(&self, section_index: usize) -> Option<&[ModuleName]> {
        self.sections
            .get(section_index)
            .map(|section| section.modules.as_slice())
    }

    pub fn missing_modules(&self) -> &BTreeMap<ModuleName, Vec<String>> {
        &self.missing_modules
    }
}
