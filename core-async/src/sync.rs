//! Synchronization primitives.
//!
//! Async-aware channels and locks come from `tokio::sync`; cooperative
//! cancellation uses `tokio_util`'s [`CancellationToken`].
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let child = token.child_token();
//! token.cancel();
//! assert!(child.is_cancelled());
//! ```

pub use tokio::sync::{mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock};
pub use tokio_util::sync::CancellationToken;
