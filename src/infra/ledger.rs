//! Result ledger: successful outcomes retained between drains.

use std::collections::HashMap;

use crate::core::TaskId;

/// Accumulator of successful task results, keyed by task id.
///
/// Entries are retained until a drain takes or clears them, so results of
/// tasks whose submitters no longer hold their handle are still reported in
/// the next drain accounting.
pub struct ResultLedger<T> {
    entries: HashMap<TaskId, T>,
}

impl<T> ResultLedger<T> {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record a successful result. A task settles at most once, so each id is
    /// inserted at most once.
    pub fn insert(&mut self, id: TaskId, value: T) {
        self.entries.insert(id, value);
    }

    /// Take every accumulated result, leaving the ledger empty.
    pub fn take_all(&mut self) -> Vec<T> {
        self.entries.drain().map(|(_, v)| v).collect()
    }

    /// Discard every accumulated result.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of accumulated results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger holds no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for ResultLedger<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_take_all() {
        let mut ledger = ResultLedger::new();
        ledger.insert(TaskId::new(), "a");
        ledger.insert(TaskId::new(), "b");
        assert_eq!(ledger.len(), 2);

        let mut taken = ledger.take_all();
        taken.sort_unstable();
        assert_eq!(taken, vec!["a", "b"]);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_clear_discards_entries() {
        let mut ledger = ResultLedger::new();
        ledger.insert(TaskId::new(), 1);
        ledger.clear();
        assert!(ledger.is_empty());
        assert!(ledger.take_all().is_empty());
    }
}
