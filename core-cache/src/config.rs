//! Cache configuration

use std::time::Duration;

/// Configuration for the tiered cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Prefix every durable-tier key is stored under (default: "tour_cache_")
    pub namespace: String,

    /// TTL for volatile entries when the caller gives none (default: 5 min).
    /// Also used when a durable hit is promoted.
    pub default_memory_ttl: Duration,

    /// TTL for durable records when the caller gives none (default: 24 h)
    pub default_storage_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: "tour_cache_".to_string(),
            default_memory_ttl: Duration::from_secs(5 * 60),
            default_storage_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_memory_ttl(mut self, ttl: Duration) -> Self {
        self.default_memory_ttl = ttl;
        self
    }

    pub fn with_storage_ttl(mut self, ttl: Duration) -> Self {
        self.default_storage_ttl = ttl;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.namespace.is_empty() {
            return Err("namespace cannot be empty".to_string());
        }

        if self.default_memory_ttl.is_zero() {
            return Err("default_memory_ttl must be greater than 0".to_string());
        }

        if self.default_storage_ttl.is_zero() {
            return Err("default_storage_ttl must be greater than 0".to_string());
        }

        Ok(())
    }
}
