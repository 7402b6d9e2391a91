//! # Tiered Cache
//!
//! A volatile in-process tier backed by a best-effort durable tier.
//!
//! ## Overview
//!
//! - [`CacheManager`] owns both tiers, promotes durable hits into memory and
//!   keeps hit/miss counters for the volatile tier.
//! - [`generate_key`] derives deterministic, order-independent keys from a
//!   prefix and a parameter object.
//! - [`CacheCatalog`] maps the named data kinds of the tour guide onto key
//!   schemes and TTL pairs.
//! - [`Cached`] wraps an async loader into a cache-through operation.
//!
//! Durable-tier failures never escape this crate: they are logged and
//! degrade to a miss or a no-op.

pub mod cached;
pub mod catalog;
pub mod config;
pub mod entry;
pub mod error;
pub mod key;
pub mod manager;
pub mod stats;

pub use cached::Cached;
pub use catalog::{nearby_params, round_coordinate, CacheCatalog, CatalogKind, TtlPair};
pub use config::CacheConfig;
pub use entry::{CacheEntry, PersistentCacheRecord};
pub use error::{CacheError, Result};
pub use key::generate_key;
pub use manager::{CacheManager, SetOptions};
pub use stats::{CacheStats, CacheStatsSnapshot};
