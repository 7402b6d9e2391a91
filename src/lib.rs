//! Workspace umbrella crate.
//!
//! Re-exports the tour guide core so host applications can depend on a single
//! crate and pick platform defaults through feature flags (`desktop-shims`
//! wires the reqwest transport and the SQLite-backed durable cache tier).

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
