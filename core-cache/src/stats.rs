//! Cache statistics

use serde::{Deserialize, Serialize};

/// Counters over volatile-tier operations. Reset by `clear()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    /// Explicit removals from the volatile tier; expiry evictions are not counted
    pub deletes: u64,
}

impl CacheStats {
    /// Hit rate as a percentage rounded to two decimals, 0 without lookups.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }

        let rate = self.hits as f64 / lookups as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }

    pub fn snapshot(&self, memory_size: usize) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits,
            misses: self.misses,
            sets: self.sets,
            deletes: self.deletes,
            hit_rate: self.hit_rate(),
            memory_size,
        }
    }
}

/// Point-in-time view returned by `CacheManager::stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub hit_rate: f64,
    pub memory_size: usize,
}

impl CacheStatsSnapshot {
    /// Hit rate formatted the way it is displayed, e.g. `"66.67%"`.
    pub fn hit_rate_display(&self) -> String {
        format!("{:.2}%", self.hit_rate)
    }
}
