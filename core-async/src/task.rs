//! Task spawning.

pub use tokio::task::{yield_now, JoinError, JoinHandle};

/// Spawns a new asynchronous task on the current Tokio runtime.
///
/// # Examples
///
/// ```rust
/// use core_async::task::spawn;
///
/// # async fn example() {
/// let handle = spawn(async { 42 });
/// assert_eq!(handle.await.unwrap(), 42);
/// # }
/// ```
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;
