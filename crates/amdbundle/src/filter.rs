//! Include/exclude filtering of module names
//!
//! A [`ResourceFilterList`] is built from an ordered list of glob patterns.
//! Patterns are folded left to right starting from the "transitively required"
//! flag, so later entries override earlier ones for names both of them match.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use log::trace;

/// `*` and `?` never cross a `/`; only `**` spans directories
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Decides whether a module belongs to a section
pub trait ModuleFilter {
    /// `transitively_required` is true when the name was reached through a
    /// dependency rather than by enumerating the pool
    fn matches(&self, name: &str, transitively_required: bool) -> bool;
}

#[derive(Debug, Clone)]
struct Matcher {
    pattern: String,
    include: bool,
    /// More than one glob only for trailing-slash patterns, one per file type
    globs: Vec<Pattern>,
}

impl Matcher {
    fn hit(&self, name: &str) -> bool {
        self.globs
            .iter()
            .any(|glob| glob.matches_with(name, MATCH_OPTIONS))
    }
}

/// Ordered list of compiled include and exclude globs
#[derive(Debug, Clone, Default)]
pub struct ResourceFilterList {
    matchers: Vec<Matcher>,
}

impl ResourceFilterList {
    /// Compile `patterns`; trailing-slash patterns only match names ending in one of `file_types`
    pub fn new<S: AsRef<str>>(patterns: &[S], file_types: &[String]) -> Result<Self> {
        let matchers = patterns
            .iter()
            .map(|pattern| compile(pattern.as_ref(), file_types))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { matchers })
    }
}

impl ModuleFilter for ResourceFilterList {
    fn matches(&self, name: &str, transitively_required: bool) -> bool {
        let accepted = self
            .matchers
            .iter()
            .fold(transitively_required, |accepted, matcher| {
                if matcher.include {
                    accepted || matcher.hit(name)
                } else {
                    accepted && !matcher.hit(name)
                }
            });
        trace!("filter {name} (required: {transitively_required}) -> {accepted}");
        accepted
    }
}

fn compile(raw: &str, file_types: &[String]) -> Result<Matcher> {
    let (include, glob) = match raw.chars().next() {
        Some('!' | '-') => (false, &raw[1..]),
        Some('+') => (true, &raw[1..]),
        _ => (true, raw),
    };

    // A bare trailing `**` only matches directories, `**/*` reaches the files below them
    let sources = if glob.ends_with("**") {
        vec![format!("{glob}/*")]
    } else if !glob.ends_with('/') {
        vec![glob.to_owned()]
    } else if file_types.is_empty() {
        vec![format!("{glob}**")]
    } else {
        file_types
            .iter()
            .map(|file_type| format!("{glob}**/*{}", Pattern::escape(file_type)))
            .collect()
    };

    let globs = sources
        .iter()
        .map(|source| Pattern::new(source))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid filter pattern '{raw}'"))?;
    Ok(Matcher {
        pattern: raw.to_owned(),
        include,
        globs,
    })
}

impl std::fmt::Display for ResourceFilterList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let patterns: Vec<&str> = self.matchers.iter().map(|m| m.pattern.as_str()).collect();
        write!(f, "[{}]", patterns.join(", "))
    }
}
