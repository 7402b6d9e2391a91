//! Pending-request registry.
//!
//! Every in-flight call holds a [`PendingGuard`]; dropping the guard removes
//! the entry, so each request leaves the registry exactly once whether it
//! succeeds, fails, times out or is cancelled.
//!
//! Retry loops waiting out a backoff hold no entry. They watch the registry's
//! current generation token instead, which [`RequestRegistry::cancel_all`]
//! trips and replaces.

use core_async::sync::CancellationToken;
use core_async::Instant;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: u64,
    pub url: String,
    pub started_at: Instant,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
pub struct RequestRegistry {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, PendingRequest>>,
    generation: Mutex<CancellationToken>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a new call. Ids increase monotonically starting at 1.
    pub fn register(self: &Arc<Self>, url: &str) -> PendingGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();

        self.pending.lock().insert(
            id,
            PendingRequest {
                id,
                url: url.to_string(),
                started_at: Instant::now(),
                cancel: token.clone(),
            },
        );

        PendingGuard {
            id,
            token,
            registry: Arc::clone(self),
        }
    }

    /// Aborts one call. Returns `false` if it already completed.
    pub fn cancel(&self, id: u64) -> bool {
        match self.pending.lock().remove(&id) {
            Some(request) => {
                request.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Token tripped by the next [`cancel_all`](Self::cancel_all).
    pub fn generation(&self) -> CancellationToken {
        self.generation.lock().clone()
    }

    /// Aborts every tracked call, empties the registry and interrupts retry
    /// backoffs. Returns how many in-flight calls were cancelled.
    pub fn cancel_all(&self) -> usize {
        let previous = std::mem::take(&mut *self.generation.lock());
        previous.cancel();

        let drained: Vec<PendingRequest> =
            self.pending.lock().drain().map(|(_, request)| request).collect();

        for request in &drained {
            request.cancel.cancel();
        }

        if !drained.is_empty() {
            debug!(count = drained.len(), "Cancelled pending requests");
        }
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Snapshot of the in-flight calls, oldest first.
    pub fn snapshot(&self) -> Vec<PendingRequest> {
        let mut pending: Vec<_> = self.pending.lock().values().cloned().collect();
        pending.sort_by_key(|request| request.id);
        pending
    }

    fn complete(&self, id: u64) {
        self.pending.lock().remove(&id);
    }
}

/// Registration handle for one call. Removes its entry on drop.
#[derive(Debug)]
pub struct PendingGuard {
    id: u64,
    token: CancellationToken,
    registry: Arc<RequestRegistry>,
}

impl PendingGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.registry.complete(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_removes_entry_once() {
        let registry = Arc::new(RequestRegistry::new());
        let a = registry.register("/a");
        let b = registry.register("/b");

        assert_eq!((a.id(), b.id()), (1, 2));
        assert_eq!(registry.len(), 2);

        drop(a);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot()[0].url, "/b");

        drop(b);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_all_signals_tokens() {
        let registry = Arc::new(RequestRegistry::new());
        let a = registry.register("/a");
        let b = registry.register("/b");

        assert_eq!(registry.cancel_all(), 2);
        assert!(a.token().is_cancelled());
        assert!(b.token().is_cancelled());
        assert!(registry.is_empty());

        // guards dropping after cancellation are harmless
        drop(a);
        drop(b);
        assert_eq!(registry.cancel_all(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all_starts_new_generation() {
        let registry = Arc::new(RequestRegistry::new());
        let before = registry.generation();

        registry.cancel_all();
        assert!(before.is_cancelled());

        let after = registry.generation();
        assert!(!after.is_cancelled());

        let call = registry.register("/a");
        assert!(!call.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_single() {
        let registry = Arc::new(RequestRegistry::new());
        let a = registry.register("/a");
        let _b = registry.register("/b");

        assert!(registry.cancel(a.id()));
        assert!(!registry.cancel(a.id()));
        assert!(a.token().is_cancelled());
        assert_eq!(registry.len(), 1);
    }
}
