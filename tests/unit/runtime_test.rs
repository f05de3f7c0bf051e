//! Tests for tokio spawner utilities

use cadence_scheduler::runtime::tokio_spawner::TokioSpawner;
use cadence_scheduler::SchedulerError;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_spawned_output_is_joinable() {
    let spawner = TokioSpawner::try_current().unwrap();
    assert_eq!(spawner.spawn(async { 6 * 7 }).await.unwrap(), 42);
}

#[test]
fn test_try_current_outside_runtime() {
    assert!(matches!(
        TokioSpawner::try_current(),
        Err(SchedulerError::Runtime(_))
    ));
}
