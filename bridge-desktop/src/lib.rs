//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpTransport` using `reqwest`
//! - `KeyValueStore` using a SQLite table (durable) or a process-local map
//!
//! Desktop has no platform audio element, so hosts embedding the core on
//! desktop inject their own `MediaBackend`.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestTransport, SqliteKeyValueStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = ReqwestTransport::new()?;
//!     let store = SqliteKeyValueStore::new("/tmp/tour/cache.db".into()).await?;
//!     // Use in core configuration
//! }
//! ```

mod http;
mod kv_store;

pub use http::ReqwestTransport;
pub use kv_store::{MemoryKeyValueStore, SqliteKeyValueStore};
