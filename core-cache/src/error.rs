use thiserror::Error;

/// Failures inside the cache. These are logged and swallowed by
/// [`CacheManager`](crate::CacheManager); only the `Cached` combinator
/// reports loader failures to its caller.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Durable store error: {0}")]
    Store(#[from] bridge_traits::BridgeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
