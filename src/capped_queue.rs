//! Capped, insertion-ordered eviction queue.
//!
//! A [`CappedQueue`] tracks up to `max_length` unique values ordered by the
//! last time they were touched through [`CappedQueue::add`] or
//! [`CappedQueue::update`]. Once an `add` pushes the queue over its limit the
//! least recently touched value is removed and handed back to the caller, who
//! typically uses it to evict the matching entry from a side map (see
//! [`crate::infra::cache::BoundedCache`]).
//!
//! # Examples
//!
//! ```
//! use cadence_scheduler::CappedQueue;
//!
//! let mut queue = CappedQueue::new(2);
//! assert_eq!(queue.add('a'), None);
//! assert_eq!(queue.add('b'), None);
//! assert_eq!(queue.add('c'), Some('a'));
//! assert_eq!(queue.front(), Some(&'b'));
//! ```

use std::hash::Hash;

use indexmap::IndexSet;

/// A bounded set of unique values ordered oldest-first by touch order.
///
/// "Oldest" is purely relative touch order, never a wall-clock timestamp.
#[derive(Debug, Clone)]
pub struct CappedQueue<T>
where
    T: Eq + Hash,
{
    max_length: usize,
    /// Oldest value at index 0, most recently touched value last.
    items: IndexSet<T>,
}

impl<T> CappedQueue<T>
where
    T: Eq + Hash,
{
    /// Create an empty queue holding at most `max_length` values.
    #[must_use]
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            items: IndexSet::with_capacity(max_length.min(1024)),
        }
    }

    /// Move `value` to the most-recent position, inserting it if absent.
    ///
    /// Returns the evicted oldest value when the queue grew past its limit.
    /// With `max_length == 0` the value just added is evicted straight away.
    pub fn add(&mut self, value: T) -> Option<T> {
        self.items.shift_remove(&value);
        self.items.insert(value);

        if self.items.len() > self.max_length {
            return self.items.shift_remove_index(0);
        }
        None
    }

    /// The least recently touched value, without removing it.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.items.first()
    }

    /// Move `value` to the most-recent position if present.
    ///
    /// Returns `false` (and inserts nothing) when `value` is not queued.
    pub fn update(&mut self, value: &T) -> bool {
        match self.items.shift_remove_full(value) {
            Some((_, owned)) => {
                self.items.insert(owned);
                true
            }
            None => false,
        }
    }

    /// Remove `value` if present.
    pub fn delete(&mut self, value: &T) {
        self.items.shift_remove(value);
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// True iff the queue holds exactly `max_length` values.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() == self.max_length
    }

    /// Number of queued values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `value` is currently queued.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.items.contains(value)
    }

    /// Configured capacity.
    #[must_use]
    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}
