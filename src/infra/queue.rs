//! FIFO dispatch queue with front reinsertion for retried work.

use std::collections::VecDeque;

/// Ordered queue of items awaiting dispatch.
///
/// Fresh submissions join at the back (FIFO); a retried item is reinserted at
/// the front, giving it priority over items that have never run. Both
/// operations are O(1).
pub struct DispatchQueue<V> {
    items: VecDeque<V>,
}

impl<V> DispatchQueue<V> {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append a fresh item at the back.
    pub fn push_back(&mut self, item: V) {
        self.items.push_back(item);
    }

    /// Reinsert a retried item at the front, ahead of never-yet-run items.
    pub fn push_front(&mut self, item: V) {
        self.items.push_front(item);
    }

    /// Remove and return the next item to dispatch.
    pub fn pop_front(&mut self) -> Option<V> {
        self.items.pop_front()
    }

    /// Remove every queued item, in dispatch order.
    pub fn drain_all(&mut self) -> Vec<V> {
        self.items.drain(..).collect()
    }

    /// Current depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<V> Default for DispatchQueue<V> {
    fn default() -> Self {
        Self::new()
    }
}
