//! Observation hook for bundle resolution
//!
//! A tracker is handed to [`crate::resolver::BundleResolver::resolve`] for a
//! single call. It sees every visit the section resolver makes but cannot
//! influence the result.

use crate::types::BundleDefinition;

#[allow(unused_variables)]
pub trait DependencyTracker {
    fn start_resolution(&mut self, bundle: &BundleDefinition) {}

    /// A module passed the filters and is about to be looked up
    fn visit_dependency(&mut self, name: &str) {}

    /// A module was reached again after it had already been visited
    fn visit_dependency_again(&mut self, name: &str) {}

    fn end_visit_dependency(&mut self, name: &str) {}

    fn end_resolution(&mut self, bundle: &BundleDefinition) {}
}

/// Tracker that records every event as a line of text, mostly useful in tests and debugging
#[derive(Debug, Clone, Default)]
pub struct RecordingTracker {
    pub events: Vec<String>,
}

impl DependencyTracker for RecordingTracker {
    fn start_resolution(&mut self, bundle: &BundleDefinition) {
        self.events.push(format!("start {}", bundle.name));
    }

    fn visit_dependency(&mut self, name: &str) {
        self.events.push(format!("visit {name}"));
    }

    fn visit_dependency_again(&mut self, name: &str) {
        self.events.push(format!("again {name}"));
    }

    fn end_visit_dependency(&mut self, name: &str) {
        self.events.push(format!("end {name}"));
    }

    fn end_resolution(&mut self, bundle: &BundleDefinition) {
        self.events.push(format!("finish {}", bundle.name));
    }
}
