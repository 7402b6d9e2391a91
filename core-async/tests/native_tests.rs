//! Integration tests for the runtime façade.
//!
//! Timing tests run on a paused clock so they are deterministic.

use core_async::{sync, task, time};
use std::sync::Arc;

#[tokio::test]
async fn spawned_task_returns_value() {
    let handle = task::spawn(async { 42 });
    assert_eq!(handle.await.unwrap(), 42);
}

#[tokio::test(start_paused = true)]
async fn sleep_advances_paused_clock() {
    let start = time::Instant::now();
    time::sleep(time::Duration::from_millis(250)).await;
    assert_eq!(start.elapsed(), time::Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn timeout_elapses_for_slow_future() {
    let result = time::timeout(time::Duration::from_millis(10), async {
        time::sleep(time::Duration::from_millis(100)).await;
        42
    })
    .await;

    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn timeout_passes_fast_future() {
    let result = time::timeout(time::Duration::from_millis(100), async {
        time::sleep(time::Duration::from_millis(10)).await;
        42
    })
    .await;

    assert_eq!(result.unwrap(), 42);
}

#[tokio::test(start_paused = true)]
async fn backoff_sequence_sums_to_expected_wait() {
    let base = time::Duration::from_millis(100);
    let start = time::Instant::now();
    for attempt in 1..=3 {
        time::sleep(time::backoff_delay(base, attempt)).await;
    }
    assert_eq!(start.elapsed(), time::Duration::from_millis(700));
}

#[tokio::test]
async fn cancellation_token_wakes_waiter() {
    let token = sync::CancellationToken::new();
    let waiter = token.clone();

    let handle = task::spawn(async move {
        waiter.cancelled().await;
        "cancelled"
    });

    task::yield_now().await;
    token.cancel();

    assert_eq!(handle.await.unwrap(), "cancelled");
}

#[tokio::test]
async fn watch_channel_reports_latest_value() {
    let (tx, mut rx) = sync::watch::channel(0u64);

    tx.send_modify(|epoch| *epoch += 1);
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), 1);
}

#[tokio::test]
async fn mutex_serializes_concurrent_increments() {
    let counter = Arc::new(sync::Mutex::new(0));
    let mut handles = vec![];

    for _ in 0..10 {
        let counter = counter.clone();
        handles.push(task::spawn(async move {
            *counter.lock().await += 1;
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(*counter.lock().await, 10);
}
