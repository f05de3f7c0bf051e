//! Bounded least-recently-used cache keyed by a [`CappedQueue`].
//!
//! The queue tracks key recency; values live in a side map. Evicting a key
//! from the queue drops its value.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use parking_lot::Mutex;

use crate::capped_queue::CappedQueue;

struct CacheState<K: Eq + Hash, V> {
    recency: CappedQueue<K>,
    values: HashMap<K, V>,
}

/// Map holding at most `capacity` entries, evicting the least recently used.
pub struct BoundedCache<K: Eq + Hash, V> {
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Empty cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                recency: CappedQueue::new(capacity),
                values: HashMap::new(),
            }),
        }
    }

    /// Cached value for `key`, marking it most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock();
        if !state.recency.update(key) {
            return None;
        }
        state.values.get(key).cloned()
    }

    /// Insert or replace `key`. Returns the key evicted to make room.
    pub fn insert(&self, key: K, value: V) -> Option<K> {
        let mut state = self.state.lock();
        state.values.insert(key.clone(), value);
        let evicted = state.recency.add(key)?;
        state.values.remove(&evicted);
        tracing::debug!("cache entry evicted");
        Some(evicted)
    }

    /// Cached value for `key`, or the result of `load` which is then cached.
    ///
    /// The lock is not held while `load` runs, so concurrent misses on the
    /// same key may each call their loader.
    ///
    /// # Errors
    ///
    /// Whatever `load` returns; nothing is cached in that case.
    pub async fn get_or_load<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = load().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Remove `key` and return its value.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock();
        state.recency.delete(key);
        state.values.remove(key)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.recency.clear();
        state.values.clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().values.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.lock().recency.max_length()
    }
}
