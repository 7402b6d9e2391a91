//! Time-related abstractions.
//!
//! Timers come from `tokio::time`, so tests can freeze and advance time with
//! `#[tokio::test(start_paused = true)]`.
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{timeout, Duration};
//!
//! # async fn example() {
//! let result = timeout(Duration::from_millis(50), async { 7 }).await;
//! assert_eq!(result.ok(), Some(7));
//! # }
//! ```

pub use std::time::{Duration, SystemTime, UNIX_EPOCH};
pub use tokio::time::{error::Elapsed, interval, sleep, timeout, Instant, Interval};

/// Returns the current wall-clock time as milliseconds since UNIX_EPOCH.
///
/// A clock set before the epoch yields `0` rather than panicking.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Exponential backoff delay for a retry attempt.
///
/// `attempt` is 1-based: the first retry waits `base`, the second `base * 2`,
/// the third `base * 4` and so on. Saturates instead of overflowing.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let factor = 2u32.saturating_pow(attempt - 1);
    base.saturating_mul(factor)
}
