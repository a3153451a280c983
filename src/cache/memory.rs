//! In-memory RAM cache tier.
//!
//! Bounded LRU keyed on the normalized text, with cumulative hit/miss
//! counters. Safe for concurrent callers — the watcher probes it directly
//! while the worker reads and writes it.

use crate::cache::normalize::normalize_key;
use crate::cache::CacheStats;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

struct Inner {
    map: HashMap<String, String>,
    /// Recency order: front = least recently used, back = most recent.
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

/// Fixed-capacity LRU cache of translations.
pub struct MemoryCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Look up a translation. A hit promotes the entry to most recently
    /// used and counts toward the hit statistics.
    pub fn get(&self, text: &str) -> Option<String> {
        let key = normalize_key(text);
        let mut inner = self.lock();

        if let Some(value) = inner.map.get(&key).cloned() {
            promote(&mut inner.order, &key);
            inner.hits += 1;
            Some(value)
        } else {
            inner.misses += 1;
            None
        }
    }

    /// Store a translation.
    ///
    /// Setting an existing key only refreshes its recency — the stored
    /// value stays. A new key may evict the least recently used entry.
    pub fn set(&self, text: &str, value: &str) {
        let key = normalize_key(text);
        let mut inner = self.lock();

        if inner.map.contains_key(&key) {
            promote(&mut inner.order, &key);
            return;
        }

        inner.map.insert(key.clone(), value.to_string());
        inner.order.push_back(key);

        if inner.map.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            }
        }
    }

    /// Drop all entries and reset the statistics.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.map.clear();
        inner.order.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats::new(inner.map.len(), self.capacity, inner.hits, inner.misses)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means another thread panicked mid-update; the
        // cache is advisory, so keep serving whatever state remains.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Move `key` to the most-recently-used position.
fn promote(order: &mut VecDeque<String>, key: &str) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        if let Some(k) = order.remove(pos) {
            order.push_back(k);
        }
    }
}
