//! Per-run record of which work items are done with.

use std::collections::BTreeSet;

/// Where an item stands for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Completed,
    Failed,
}

/// Names of items that are finished, one way or the other.
///
/// Nothing is ever removed. Once an item is completed or failed it is never
/// selected again, which is what keeps the traversal from retrying a
/// poisoned item forever. The first terminal status recorded for a name
/// sticks, so no name is ever both completed and failed.
#[derive(Debug, Clone, Default)]
pub struct ItemTracker {
    failed: BTreeSet<String>,
    completed: BTreeSet<String>,
}

impl ItemTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff the item is neither failed nor completed.
    pub fn is_eligible(&self, name: &str) -> bool {
        self.status(name) == ItemStatus::Pending
    }

    pub fn status(&self, name: &str) -> ItemStatus {
        if self.completed.contains(name) {
            ItemStatus::Completed
        } else if self.failed.contains(name) {
            ItemStatus::Failed
        } else {
            ItemStatus::Pending
        }
    }

    /// Quarantine an item. Returns false if it already had a terminal status.
    pub fn mark_failed(&mut self, name: &str) -> bool {
        if !self.is_eligible(name) {
            return false;
        }
        self.failed.insert(name.to_string())
    }

    /// Record an item as confirmed. Returns false if it already had a
    /// terminal status.
    pub fn mark_completed(&mut self, name: &str) -> bool {
        if !self.is_eligible(name) {
            return false;
        }
        self.completed.insert(name.to_string())
    }

    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(String::as_str)
    }

    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }
}
