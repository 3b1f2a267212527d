//! Conflict queries against a loaded [`IntervalTree`].

use crate::index::IntervalTree;
use crate::interval::{CalendarInterval, Interval};

/// Read-only conflict lookup for candidate meeting times.
///
/// Borrowing the tree immutably means no insert can happen while an
/// `OverlapQuery` is alive.
#[derive(Debug, Clone, Copy)]
pub struct OverlapQuery<'a> {
    index: &'a IntervalTree,
}

impl<'a> OverlapQuery<'a> {
    /// Creates a query engine over a fully loaded index.
    pub fn new(index: &'a IntervalTree) -> Self {
        Self { index }
    }

    /// Returns every stored event that intersects `candidate`.
    pub fn conflicts(&self, candidate: &Interval) -> Vec<&'a CalendarInterval> {
        self.index.overlap(candidate)
    }

    /// Same as [`conflicts`](Self::conflicts), ordered by start then end.
    pub fn conflicts_sorted(&self, candidate: &Interval) -> Vec<&'a CalendarInterval> {
        let mut found = self.conflicts(candidate);
        found.sort_by_key(|c| (c.start(), c.end()));
        found
    }

    /// Returns true if anything intersects `candidate`.
    pub fn has_conflict(&self, candidate: &Interval) -> bool {
        !self.conflicts(candidate).is_empty()
    }

    /// Number of conflicting events, duplicates included.
    pub fn count(&self, candidate: &Interval) -> usize {
        self.conflicts(candidate).len()
    }
}
