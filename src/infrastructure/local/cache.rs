use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use dashmap::DashMap;

/// Concurrent map without eviction or expiry
///
/// Readers and writers never block each other across keys; writes to the
/// same key are serialized by the map, and the last store wins. Values are
/// cloned on the way out, so callers never share a cached value.
pub struct LocalCache<K, V> {
    entries: DashMap<K, V>,
}

impl<K, V> LocalCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn load<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn store(&self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    /// Snapshot of every cached value, in no particular order
    pub fn values(&self) -> Vec<V> {
        self.entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for LocalCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> fmt::Debug for LocalCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
