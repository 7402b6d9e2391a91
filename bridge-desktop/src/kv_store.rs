//! Key-value storage for the durable cache tier

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::KeyValueStore,
};
use parking_lot::RwLock;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS kv_store (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

/// SQLite-backed key-value store
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    /// Open (or create) the store at the given database path
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        // SQLite URLs use forward slashes on every platform
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path_str))
            .map_err(|e| BridgeError::Storage(format!("Invalid database path: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to connect to DB: {}", e)))?;

        Self::create_table(&pool).await?;
        debug!(path = ?db_path, "Initialized key-value store");

        Ok(Self { pool })
    }

    /// Create an in-memory store (for testing)
    pub async fn in_memory() -> Result<Self> {
        // every pooled connection would otherwise get its own private database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to connect to DB: {}", e)))?;

        Self::create_table(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_table(pool: &SqlitePool) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to create table: {}", e)))?;
        Ok(())
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to read key: {}", e)))?;

        Ok(row.map(|row| row.get(0)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Self::now())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::Storage(format!("Failed to write key: {}", e)))?;

        debug!(key = key, "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to delete key: {}", e)))?;

        debug!(key = key, "Deleted value");
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to list keys: {}", e)))?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM kv_store WHERE substr(key, 1, ?) = ? ORDER BY key")
            .bind(prefix.chars().count() as i64)
            .bind(prefix)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to list keys: {}", e)))?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }
}

/// Process-local store for hosts without persistent storage and for tests.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_set_get_remove() {
        let store = SqliteKeyValueStore::in_memory().await.unwrap();

        store.set("tour_cache_a", "{\"v\":1}").await.unwrap();
        assert_eq!(
            store.get("tour_cache_a").await.unwrap(),
            Some("{\"v\":1}".to_string())
        );

        store.set("tour_cache_a", "{\"v\":2}").await.unwrap();
        assert_eq!(
            store.get("tour_cache_a").await.unwrap(),
            Some("{\"v\":2}".to_string())
        );

        store.remove("tour_cache_a").await.unwrap();
        assert_eq!(store.get("tour_cache_a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_prefix_listing() {
        let store = SqliteKeyValueStore::in_memory().await.unwrap();

        store.set("tour_cache_a", "1").await.unwrap();
        store.set("tour_cache_b", "2").await.unwrap();
        store.set("settings_theme", "dark").await.unwrap();

        let keys = store.keys_with_prefix("tour_cache_").await.unwrap();
        assert_eq!(keys, vec!["tour_cache_a", "tour_cache_b"]);

        let all = store.list_keys().await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_sqlite_file_store_persists() {
        let dir = std::env::temp_dir().join(format!("kv-store-test-{}", std::process::id()));
        let path = dir.join("cache.db");

        {
            let store = SqliteKeyValueStore::new(path.clone()).await.unwrap();
            store.set("k", "v").await.unwrap();
        }

        let reopened = SqliteKeyValueStore::new(path).await.unwrap();
        assert_eq!(reopened.get("k").await.unwrap(), Some("v".to_string()));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_memory_store_prefix_listing() {
        let store = MemoryKeyValueStore::new();
        store.set("tour_cache_x", "1").await.unwrap();
        store.set("other", "2").await.unwrap();

        assert_eq!(
            store.keys_with_prefix("tour_cache_").await.unwrap(),
            vec!["tour_cache_x"]
        );
        store.remove("missing").await.unwrap();
        assert_eq!(store.len(), 2);
    }
}
