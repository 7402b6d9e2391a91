//! Durable Key-Value Storage Abstraction
//!
//! Backs the durable cache tier. Hosts map it onto whatever persistent
//! preferences store the platform offers:
//! - Desktop: SQLite table
//! - iOS: UserDefaults
//! - Android: SharedPreferences / DataStore
//! - Web: localStorage
//!
//! Values are opaque strings; callers serialize their own records.

use async_trait::async_trait;

use crate::error::Result;

/// Durable key-value store trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// async fn remember(store: &dyn KeyValueStore) -> Result<()> {
///     store.set("last_style", "history").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieve a value, `Ok(None)` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite a value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// List every key in the store.
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// List keys starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .list_keys()
            .await?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}
