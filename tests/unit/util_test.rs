//! Tests for utility functions

use std::time::Duration;

use cadence_scheduler::util::{init_tracing, Clock, SystemClock, TokioClock};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::debug!("tracing initialised");
}

#[tokio::test(start_paused = true)]
async fn test_tokio_clock_advances_with_sleep() {
    let clock = TokioClock::new();
    let before = clock.now();
    clock.sleep(Duration::from_secs(90)).await;
    assert_eq!((clock.now() - before).num_seconds(), 90);
}

#[tokio::test]
async fn test_system_clock_sleeps() {
    let clock = SystemClock;
    let before = clock.now();
    clock.sleep(Duration::from_millis(5)).await;
    assert!(clock.now() >= before);
}
