//! # Cache Manager
//!
//! Two-tier cache: a volatile map guarded by a mutex, and an optional durable
//! key-value store reached through the host bridge.
//!
//! - Every volatile write sweeps expired entries, so an expired value is never
//!   returned and never outlives the next write.
//! - A durable hit found by [`CacheManager::get`] is promoted back into the
//!   volatile tier with the default memory TTL.
//! - Durable-tier failures are logged at `warn` and degrade to a miss or a
//!   no-op. Nothing in this module returns an error to the caller.
//!
//! The volatile lock is never held across an `.await`; an entry may therefore
//! be evicted between a volatile miss and the durable read that follows it.
//! Writes are idempotent, so such interleavings are harmless.

use crate::{
    config::CacheConfig,
    entry::{CacheEntry, PersistentCacheRecord},
    error::{CacheError, Result},
    key::generate_key,
    stats::{CacheStats, CacheStatsSnapshot},
};
use bridge_traits::{Clock, KeyValueStore, SystemClock};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Which tiers a [`CacheManager::set`] writes, and with which TTLs.
///
/// The default writes both tiers using the configured default TTLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub memory_ttl: Option<Duration>,
    pub storage_ttl: Option<Duration>,
    pub memory_only: bool,
    pub storage_only: bool,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory_ttl(mut self, ttl: Duration) -> Self {
        self.memory_ttl = Some(ttl);
        self
    }

    pub fn storage_ttl(mut self, ttl: Duration) -> Self {
        self.storage_ttl = Some(ttl);
        self
    }

    pub fn memory_only(mut self) -> Self {
        self.memory_only = true;
        self
    }

    pub fn storage_only(mut self) -> Self {
        self.storage_only = true;
        self
    }
}

#[derive(Default)]
struct MemoryTier {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

impl MemoryTier {
    fn sweep(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }
}

pub struct CacheManager {
    config: CacheConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Arc<dyn Clock>,
    memory: Mutex<MemoryTier>,
}

impl CacheManager {
    /// Create a cache over an optional durable store.
    ///
    /// Without a store every durable-tier operation is a no-op and
    /// [`get`](Self::get) only consults memory.
    pub fn new(
        config: CacheConfig,
        store: Option<Arc<dyn KeyValueStore>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
            memory: Mutex::new(MemoryTier::default()),
        }
    }

    /// Like [`new`](Self::new), rejecting an invalid configuration.
    pub fn try_new(
        config: CacheConfig,
        store: Option<Arc<dyn KeyValueStore>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate().map_err(CacheError::InvalidConfig)?;
        Ok(Self::new(config, store, clock))
    }

    /// Volatile-only cache on the system clock.
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::new(config, None, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn has_durable_tier(&self) -> bool {
        self.store.is_some()
    }

    /// See [`generate_key`].
    pub fn generate_key(&self, prefix: &str, params: &Value) -> String {
        generate_key(prefix, params)
    }

    fn now(&self) -> i64 {
        self.clock.unix_timestamp_millis()
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.config.namespace, key)
    }

    // ---------------------------------------------------------------------
    // Volatile tier
    // ---------------------------------------------------------------------

    /// Insert or overwrite `key`, expiring after `ttl`.
    ///
    /// Sweeps every expired volatile entry as a side effect. No count-based
    /// eviction happens here; the tier grows with the number of live keys.
    pub fn set_memory(&self, key: &str, value: Value, ttl: Duration) {
        let now = self.now();
        let ttl_ms = duration_millis(ttl);

        let mut memory = self.memory.lock();
        memory
            .entries
            .insert(key.to_string(), CacheEntry::new(value, now, ttl_ms));
        memory.stats.sets += 1;

        let swept = memory.sweep(now);
        if swept > 0 {
            debug!(swept, "Swept expired cache entries");
        }
    }

    /// Returns the live value for `key`, counting a hit or a miss.
    pub fn get_memory(&self, key: &str) -> Option<Value> {
        let now = self.now();
        let mut guard = self.memory.lock();
        let memory = &mut *guard;

        let expired = match memory.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.touch(now);
                memory.stats.hits += 1;
                debug!(key, "Memory cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            memory.entries.remove(key);
        }
        memory.stats.misses += 1;
        debug!(key, expired, "Memory cache miss");
        None
    }

    /// Removes `key` from the volatile tier. Returns whether it was present.
    pub fn remove_memory(&self, key: &str) -> bool {
        let mut memory = self.memory.lock();
        let removed = memory.entries.remove(key).is_some();
        if removed {
            memory.stats.deletes += 1;
        }
        removed
    }

    /// Whether a live volatile entry exists. Does not touch statistics.
    pub fn has(&self, key: &str) -> bool {
        let now = self.now();
        self.memory
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Live volatile keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = self.now();
        let memory = self.memory.lock();
        let mut keys: Vec<String> = memory
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Evicts every expired volatile entry and returns how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.now();
        self.memory.lock().sweep(now)
    }

    /// Number of entries currently held in memory, expired or not.
    pub fn memory_size(&self) -> usize {
        self.memory.lock().entries.len()
    }

    // ---------------------------------------------------------------------
    // Durable tier
    // ---------------------------------------------------------------------

    /// Writes a durable record. Returns `false` when there is no store or the
    /// write failed.
    pub async fn set_storage(&self, key: &str, value: &Value, ttl: Duration) -> bool {
        let Some(store) = &self.store else {
            return false;
        };

        let record = PersistentCacheRecord::new(value.clone(), self.now(), duration_millis(ttl));
        match write_record(store.as_ref(), &self.storage_key(key), &record).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Durable cache write failed");
                false
            }
        }
    }

    /// Reads a durable record, treating expired or unreadable records as absent.
    pub async fn get_storage(&self, key: &str) -> Option<Value> {
        let store = self.store.as_ref()?;
        let storage_key = self.storage_key(key);

        let record = match read_record(store.as_ref(), &storage_key).await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(CacheError::Serialization(e)) => {
                warn!(key, error = %e, "Discarding malformed durable cache record");
                self.delete_durable(store.as_ref(), &storage_key).await;
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Durable cache read failed");
                return None;
            }
        };

        if record.is_expired(self.now()) {
            debug!(key, "Durable cache record expired");
            self.delete_durable(store.as_ref(), &storage_key).await;
            return None;
        }

        Some(record.value)
    }

    /// Deletes a durable record. Returns `false` when there is no store or the
    /// delete failed.
    pub async fn remove_storage(&self, key: &str) -> bool {
        match &self.store {
            Some(store) => self.delete_durable(store.as_ref(), &self.storage_key(key)).await,
            None => false,
        }
    }

    async fn delete_durable(&self, store: &dyn KeyValueStore, storage_key: &str) -> bool {
        match store.remove(storage_key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = storage_key, error = %e, "Durable cache delete failed");
                false
            }
        }
    }

    // ---------------------------------------------------------------------
    // Combined
    // ---------------------------------------------------------------------

    /// Looks `key` up in memory, then in durable storage.
    ///
    /// A durable hit is promoted into memory with the default memory TTL.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.get_memory(key) {
            return Some(value);
        }

        let value = self.get_storage(key).await?;
        debug!("Promoting durable cache hit into memory");
        self.set_memory(key, value.clone(), self.config.default_memory_ttl);
        Some(value)
    }

    /// Writes `value` to the tiers selected by `options`.
    pub async fn set(&self, key: &str, value: Value, options: SetOptions) {
        let memory_ttl = options.memory_ttl.unwrap_or(self.config.default_memory_ttl);
        let storage_ttl = options
            .storage_ttl
            .unwrap_or(self.config.default_storage_ttl);

        if !options.memory_only {
            self.set_storage(key, &value, storage_ttl).await;
        }

        if !options.storage_only {
            self.set_memory(key, value, memory_ttl);
        }
    }

    /// Removes `key` from both tiers.
    pub async fn remove(&self, key: &str) {
        self.remove_memory(key);
        self.remove_storage(key).await;
    }

    /// Empties memory, deletes every durable record under the namespace and
    /// resets statistics.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        self.memory.lock().entries.clear();

        let mut removed = 0usize;
        if let Some(store) = &self.store {
            match store.keys_with_prefix(&self.config.namespace).await {
                Ok(keys) => {
                    for storage_key in keys {
                        if self.delete_durable(store.as_ref(), &storage_key).await {
                            removed += 1;
                        }
                    }
                }
                Err(e) => warn!(error = %e, "Failed to enumerate durable cache keys"),
            }
        }

        self.memory.lock().stats = CacheStats::default();
        info!(durable_removed = removed, "Cache cleared");
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        let memory = self.memory.lock();
        memory.stats.snapshot(memory.entries.len())
    }

    // ---------------------------------------------------------------------
    // Typed access
    // ---------------------------------------------------------------------

    /// [`get`](Self::get) followed by deserialization. A value of the wrong
    /// shape counts as a miss.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                debug!(key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Serializes `value` and stores it. Returns `false` if it cannot be
    /// represented as JSON.
    pub async fn set_as<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        options: SetOptions,
    ) -> bool {
        match serde_json::to_value(value) {
            Ok(json) => {
                self.set(key, json, options).await;
                true
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to encode cache value");
                false
            }
        }
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("config", &self.config)
            .field("durable", &self.store.is_some())
            .field("memory_size", &self.memory_size())
            .finish()
    }
}

async fn read_record(
    store: &dyn KeyValueStore,
    storage_key: &str,
) -> Result<Option<PersistentCacheRecord>> {
    let Some(raw) = store.get(storage_key).await? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

async fn write_record(
    store: &dyn KeyValueStore,
    storage_key: &str,
    record: &PersistentCacheRecord,
) -> Result<()> {
    let raw = serde_json::to_string(record)?;
    store.set(storage_key, &raw).await?;
    Ok(())
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
