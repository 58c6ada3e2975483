//! Shared type definitions for the amdbundle crate
//!
//! This module contains the declarative bundle definition types that are read
//! from configuration and consumed by the resolver.

use serde::{Deserialize, Serialize};

/// Pool-wide unique, path-like module name (e.g. `sap/m/Button.js`)
pub type ModuleName = String;

/// File types a trailing-slash filter expands to when a bundle does not say otherwise
pub const DEFAULT_FILE_TYPES: &[&str] = &[".js", ".view.xml", ".fragment.xml", ".json"];

/// How the modules selected by a section end up in the bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionMode {
    /// Modules are emitted as-is, in dependency order unless sorting is disabled
    Raw,
    /// Modules are only required at the end of the bundle
    Require,
    /// Dependency information for the modules is emitted into a cache
    DepCache,
    /// Modules are emitted as preloadable module definitions
    Preload,
    /// Modules are listed in a named sub-bundle descriptor
    BundleInfo,
    /// Legacy mode taking its module list from another bundle file
    Provided,
}

/// State handling policy of a section with respect to the other sections of a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionScope {
    /// The section starts from an empty selection and leaves no trace behind
    Isolated,
    /// The section shares the selection with its siblings; earlier claims win
    Accumulating,
}

impl SectionMode {
    /// Scope policy the resolver applies to sections of this mode
    pub const fn scope(self) -> SectionScope {
        match self {
            Self::Require | Self::DepCache => SectionScope::Isolated,
            Self::Raw | Self::Preload | Self::BundleInfo | Self::Provided => {
                SectionScope::Accumulating
            }
        }
    }
}

impl std::fmt::Display for SectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw => write!(f, "raw"),
            Self::Require => write!(f, "require"),
            Self::DepCache => write!(f, "depCache"),
            Self::Preload => write!(f, "preload"),
            Self::BundleInfo => write!(f, "bundleInfo"),
            Self::Provided => write!(f, "provided"),
        }
    }
}

/// One ordered rule set within a bundle definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Section {
    pub mode: SectionMode,
    /// Sub-bundle name, only meaningful for `bundleInfo` sections
    #[serde(default)]
    pub name: Option<String>,
    /// Ordered include (`pattern`, `+pattern`) and exclude (`!pattern`, `-pattern`) globs
    #[serde(default)]
    pub filters: Vec<String>,
    /// Follow the dependencies of selected modules
    #[serde(default)]
    pub resolve: bool,
    /// Also follow dependencies that are only loaded conditionally
    #[serde(default)]
    pub resolve_conditional: bool,
    /// Pull in the conventionally named renderer of every selected module
    #[serde(default)]
    pub renderer: bool,
    #[serde(default = "default_sort")]
    pub sort: bool,
    /// Overrides the bundle's file types for this section
    #[serde(default)]
    pub default_file_types: Option<Vec<String>>,
}

const fn default_sort() -> bool {
    true
}

impl Section {
    /// Create a section of the given mode with the given filters and all flags at their defaults
    pub fn new<S: Into<String>>(mode: SectionMode, filters: impl IntoIterator<Item = S>) -> Self {
        Self {
            mode,
            name: None,
            filters: filters.into_iter().map(Into::into).collect(),
            resolve: false,
            resolve_conditional: false,
            renderer: false,
            sort: true,
            default_file_types: None,
        }
    }

    #[must_use]
    pub fn resolving(mut self) -> Self {
        self.resolve = true;
        self
    }

    #[must_use]
    pub fn resolving_conditional(mut self) -> Self {
        self.resolve = true;
        self.resolve_conditional = true;
        self
    }

    #[must_use]
    pub fn with_renderer(mut self) -> Self {
        self.renderer = true;
        self
    }

    #[must_use]
    pub fn unsorted(mut self) -> Self {
        self.sort = false;
        self
    }

    /// File types used to expand trailing-slash filters, falling back to the bundle's
    pub fn file_types<'a>(&'a self, bundle: &'a BundleDefinition) -> &'a [String] {
        self.default_file_types
            .as_deref()
            .unwrap_or(&bundle.default_file_types)
    }
}

/// Declarative description of one bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BundleDefinition {
    pub name: String,
    #[serde(default = "default_file_types")]
    pub default_file_types: Vec<String>,
    #[serde(default, rename = "section")]
    pub sections: Vec<Section>,
}

fn default_file_types() -> Vec<String> {
    DEFAULT_FILE_TYPES.iter().map(|t| (*t).to_owned()).collect()
}

impl BundleDefinition {
    pub fn new(name: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            name: name.into(),
            default_file_types: default_file_types(),
            sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_scopes() {
        assert_eq!(SectionMode::Require.scope(), SectionScope::Isolated);
        assert_eq!(SectionMode::DepCache.scope(), SectionScope::Isolated);
        assert_eq!(SectionMode::Raw.scope(), SectionScope::Accumulating);
        assert_eq!(SectionMode::Preload.scope(), SectionScope::Accumulating);
        assert_eq!(SectionMode::BundleInfo.scope(), SectionScope::Accumulating);
    }

    #[test]
    fn test_section_file_types_fall_back_to_bundle() {
        let mut section = Section::new(SectionMode::Preload, ["app/"]);
        let bundle = BundleDefinition::new("app/bundle.js", vec![section.clone()]);
        assert_eq!(section.file_types(&bundle), bundle.default_file_types.as_slice());

        section.default_file_types = Some(vec![".js".to_owned()]);
        assert_eq!(section.file_types(&bundle), [".js".to_owned()].as_slice());
    }
}
