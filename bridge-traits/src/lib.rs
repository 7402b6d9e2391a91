//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the tour guide core and the
//! platform it runs on. Each trait is a capability the core needs but that is
//! provided differently per host (desktop, mini-program, mobile, web).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpTransport`](http::HttpTransport) - Request/response transport; dropping the future aborts
//!
//! ### Storage
//! - [`KeyValueStore`](storage::KeyValueStore) - Durable string store backing the cache's durable tier
//!
//! ### Media
//! - [`MediaBackend`](media::MediaBackend) - Creates platform media sessions
//! - [`MediaSession`](media::MediaSession) - One audio element with observer-style event subscription
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! Storage and media traits use [`BridgeError`](error::BridgeError). The
//! transport reports [`TransportError`](http::TransportError) with a native
//! failure code so callers can classify retryability.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind an `Arc`.

pub mod error;
pub mod http;
pub mod media;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError, TransportErrorCode,
};
pub use media::{
    MediaBackend, MediaEvent, MediaEventEmitter, MediaEventKind, MediaListener, MediaSession,
    Subscription,
};
pub use storage::KeyValueStore;
pub use time::{Clock, LogLevel, ManualClock, SystemClock};
