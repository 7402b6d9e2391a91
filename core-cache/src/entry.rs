//! Records held by the two cache tiers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Volatile-tier record. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: Value,
    pub expire_at: i64,
    pub access_count: u64,
    pub last_access_at: i64,
}

impl CacheEntry {
    pub fn new(value: Value, now: i64, ttl_ms: i64) -> Self {
        Self {
            value,
            expire_at: now.saturating_add(ttl_ms),
            access_count: 0,
            last_access_at: now,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expire_at
    }

    pub(crate) fn touch(&mut self, now: i64) {
        self.access_count += 1;
        self.last_access_at = now;
    }
}

/// Durable-tier record as stored in the key-value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentCacheRecord {
    pub value: Value,
    pub expire_time: i64,
    pub create_time: i64,
}

impl PersistentCacheRecord {
    pub fn new(value: Value, now: i64, ttl_ms: i64) -> Self {
        Self {
            value,
            expire_time: now.saturating_add(ttl_ms),
            create_time: now,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expire_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_expiry_boundary() {
        let entry = CacheEntry::new(json!(1), 1_000, 500);
        assert!(!entry.is_expired(1_500));
        assert!(entry.is_expired(1_501));
    }

    #[test]
    fn test_record_wire_shape() {
        let record = PersistentCacheRecord::new(json!({"name": "Forbidden City"}), 10, 20);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["expireTime"], 30);
        assert_eq!(json["createTime"], 10);
        assert_eq!(json["value"]["name"], "Forbidden City");
    }
}
