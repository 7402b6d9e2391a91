//! Cache-through combinator.
//!
//! Wraps an async loader and a key function into an operation that answers
//! from the cache when it can and stores fresh results when it cannot.
//!
//! ```ignore
//! let styles = Cached::new(cache.clone(), |_: &()| "styles".to_string(), |_| api.styles())
//!     .with_options(SetOptions::new().memory_ttl(Duration::from_secs(3600)));
//!
//! let first = styles.call(()).await?;   // loader runs
//! let second = styles.call(()).await?;  // served from memory
//! ```

use crate::manager::{CacheManager, SetOptions};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

pub struct Cached<K, F> {
    cache: Arc<CacheManager>,
    key_fn: K,
    loader: F,
    options: SetOptions,
}

impl<K, F> Cached<K, F> {
    pub fn new(cache: Arc<CacheManager>, key_fn: K, loader: F) -> Self {
        Self {
            cache,
            key_fn,
            loader,
            options: SetOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SetOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the cached value for `arg`, or runs the loader and caches its
    /// successful result. Loader errors are returned unchanged and nothing is
    /// stored.
    pub async fn call<A, T, E, Fut>(&self, arg: A) -> Result<T, E>
    where
        K: Fn(&A) -> String,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize + DeserializeOwned,
    {
        let key = (self.key_fn)(&arg);

        if let Some(hit) = self.cache.get_as::<T>(&key).await {
            return Ok(hit);
        }

        debug!(key = %key, "Cache miss, running loader");
        let value = (self.loader)(arg).await?;
        self.cache.set_as(&key, &value, self.options).await;
        Ok(value)
    }

    /// Drops whatever is cached for `arg` in both tiers.
    pub async fn invalidate<A>(&self, arg: &A)
    where
        K: Fn(&A) -> String,
    {
        self.cache.remove(&(self.key_fn)(arg)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_loader_runs_once_per_key() {
        let cache = Arc::new(CacheManager::in_memory(CacheConfig::default()));
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let doubled = Cached::new(
            cache.clone(),
            |n: &u32| format!("double_{}", n),
            move |n: u32| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(n * 2)
                }
            },
        );

        assert_eq!(doubled.call(4).await, Ok(8));
        assert_eq!(doubled.call(4).await, Ok(8));
        assert_eq!(doubled.call(5).await, Ok(10));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        doubled.invalidate(&4).await;
        assert_eq!(doubled.call(4).await, Ok(8));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = Arc::new(CacheManager::in_memory(CacheConfig::default()));
        let failing = Cached::new(
            cache.clone(),
            |_: &()| "always_fails".to_string(),
            |_: ()| async { Err::<u32, _>("offline") },
        );

        assert_eq!(failing.call(()).await, Err("offline"));
        assert!(!cache.has("always_fails"));
    }
}
