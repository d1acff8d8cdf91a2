//! In-memory waiting queue kept sorted by ascending priority.
//!
//! Entries are spliced in at a binary-searched index rather than pushed onto a
//! heap, so the queue is always observable in dispatch order and equal priorities
//! keep their arrival order without any timestamp tie-breaker.

use std::collections::VecDeque;

use crate::core::request::Priority;

/// Anything that can sit in the waiting queue.
pub trait Prioritized {
    /// Dispatch urgency; lower values leave the queue first.
    fn priority(&self) -> Priority;
}

impl Prioritized for Priority {
    fn priority(&self) -> Priority {
        *self
    }
}

/// Index at which an entry of `priority` must be spliced into `queue` so that the
/// queue stays sorted and the new entry lands after every entry with priority
/// `<= priority`.
#[must_use]
pub fn insertion_index<T: Prioritized>(queue: &[T], priority: Priority) -> usize {
    insertion_index_by(queue.len(), priority, |i| queue[i].priority())
}

/// [`insertion_index`] over any indexable sorted sequence of length `len`.
pub fn insertion_index_by<F>(len: usize, priority: Priority, priority_at: F) -> usize
where
    F: Fn(usize) -> Priority,
{
    if len == 0 {
        return 0;
    }
    if priority_at(len - 1) <= priority {
        return len;
    }
    if priority_at(0) > priority {
        return 0;
    }

    // priority_at(from) <= priority < priority_at(to)
    let (mut from, mut to) = (0, len - 1);
    while to - from > 1 {
        let mid = from + (to - from).div_ceil(2);
        if priority_at(mid) <= priority {
            from = mid;
        } else {
            to = mid;
        }
    }
    to
}

/// Priority-ordered FIFO of waiting entries.
#[derive(Debug)]
pub struct PriorityQueue<T> {
    entries: VecDeque<T>,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PriorityQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Number of waiting entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return the head (most urgent, earliest) entry.
    pub fn pop_front(&mut self) -> Option<T> {
        self.entries.pop_front()
    }

    /// The head entry without removing it.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.entries.front()
    }

    /// Entries in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

impl<T: Prioritized> PriorityQueue<T> {
    /// Where an entry of `priority` would be inserted.
    #[must_use]
    pub fn insertion_index(&self, priority: Priority) -> usize {
        insertion_index_by(self.entries.len(), priority, |i| self.entries[i].priority())
    }

    /// Splice `entry` in at `index`.
    ///
    /// # Panics
    ///
    /// If `index > len()`.
    pub fn insert(&mut self, index: usize, entry: T) {
        debug_assert!(
            index == 0 || self.entries[index - 1].priority() <= entry.priority(),
            "insertion index breaks sort order"
        );
        self.entries.insert(index, entry);
    }

    /// Insert at the searched index and return that index.
    pub fn push(&mut self, entry: T) -> usize {
        let index = self.insertion_index(entry.priority());
        self.insert(index, entry);
        index
    }

    /// Priorities in dispatch order.
    #[must_use]
    pub fn priorities(&self) -> Vec<Priority> {
        self.entries.iter().map(Prioritized::priority).collect()
    }
}
