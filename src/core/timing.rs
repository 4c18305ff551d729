// src/core/timing.rs

use crate::core::property::PropertyTree;
use std::time::Duration;

/// Elapsed wall-clock time of named phases, in the order they were recorded.
#[derive(Debug, Clone, Default)]
pub struct TimeInfo {
    entries: Vec<(String, Duration)>,
}

impl TimeInfo {
    /// No phase recorded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that phase `label` took `elapsed`.
    pub fn record(&mut self, label: &str, elapsed: Duration) {
        log::trace!("Phase '{}' took {} ms", label, elapsed.as_millis());
        self.entries.push((label.to_string(), elapsed));
    }

    /// One leaf per phase, value in milliseconds.
    pub fn properties(&self) -> PropertyTree {
        let mut tree = PropertyTree::new();
        for (label, elapsed) in &self.entries {
            tree.add(1, label.as_str(), elapsed.as_millis().to_string());
        }
        tree
    }
}
