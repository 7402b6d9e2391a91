//! Async runtime façade for the tour guide core.
//!
//! Core crates depend on this crate instead of reaching for `tokio` directly,
//! so timer, task and synchronization choices live in one place.
//!
//! # Modules
//!
//! - `task`: Task spawning
//! - `time`: Sleep, timeout, instants and wall-clock helpers
//! - `sync`: Channels, locks and cancellation tokens
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{sleep, Duration};
//!
//! # async fn example() {
//! let handle = core_async::spawn(async {
//!     sleep(Duration::from_millis(10)).await;
//!     42
//! });
//! # let _ = handle;
//! # }
//! ```

pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};

/// Waits on several futures and runs the branch of the first to complete.
pub use tokio::select;
