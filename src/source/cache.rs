use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Thread-safe memoisation layer for data source lookups
///
/// Keyed by `txid:vout` for previous outputs and by txid for confirmation
/// heights. Clones share the same storage.
#[derive(Clone)]
pub struct LookupCache<K, V> {
    name: &'static str,
    cache: Arc<Mutex<HashMap<K, V>>>,
    hits: Arc<Mutex<u64>>,
    misses: Arc<Mutex<u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K, V> LookupCache<K, V>
where
    K: Eq + Hash + Display,
    V: Clone,
{
    /// Create a new empty cache, `name` only appears in logs
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            cache: Arc::new(Mutex::new(HashMap::new())),
            hits: Arc::new(Mutex::new(0)),
            misses: Arc::new(Mutex::new(0)),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let cache = lock(&self.cache);
        match cache.get(key) {
            Some(value) => {
                *lock(&self.hits) += 1;
                debug!("{} cache hit: {}", self.name, key);
                Some(value.clone())
            }
            None => {
                *lock(&self.misses) += 1;
                debug!("{} cache miss: {}", self.name, key);
                None
            }
        }
    }

    pub fn put(&self, key: K, value: V) {
        debug!("{} cached: {}", self.name, key);
        lock(&self.cache).insert(key, value);
    }

    pub fn get_stats(&self) -> CacheStats {
        CacheStats {
            hits: *lock(&self.hits),
            misses: *lock(&self.misses),
        }
    }

    pub fn size(&self) -> usize {
        lock(&self.cache).len()
    }
}

/// Cache performance statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            (self.hits as f64 / (self.hits + self.misses) as f64) * 100.0
        }
    }

    /// Get total cache requests
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }
}
