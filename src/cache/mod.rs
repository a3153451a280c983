//! Two-tier translation cache.
//!
//! A fast bounded RAM tier backed by a durable SQLite tier, both keyed on
//! the same normalized text fingerprint. The RAM tier answers first; a
//! durable hit is promoted back into RAM. Each tier owns its own lock —
//! the watcher and the worker probe them concurrently.

pub mod memory;
pub mod normalize;
pub mod store;

pub use memory::MemoryCache;
pub use normalize::normalize_key;
pub use store::{SqliteStore, StoredTranslation};

use serde::{Deserialize, Serialize};

/// Observability counters for the RAM tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    /// Hit percentage over all lookups, 0.0 when none happened yet.
    pub hit_rate: f64,
}

impl CacheStats {
    pub fn new(size: usize, capacity: usize, hits: u64, misses: u64) -> Self {
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            size,
            capacity,
            hits,
            misses,
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_zero_without_lookups() {
        let stats = CacheStats::new(0, 500, 0, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn hit_rate_is_a_percentage() {
        let stats = CacheStats::new(3, 500, 3, 1);
        assert!((stats.hit_rate - 75.0).abs() < f64::EPSILON);
    }
}
