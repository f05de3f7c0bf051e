//! Tests for builder modules

use std::collections::HashMap;
use std::sync::Arc;

use cadence_scheduler::builders::SchedulerBuilder;
use cadence_scheduler::config::SchedulerConfig;
use cadence_scheduler::core::StandardCron;
use cadence_scheduler::runtime::TokioSpawner;
use cadence_scheduler::util::TokioClock;
use cadence_scheduler::SchedulerError;

#[tokio::test]
async fn test_builder_defaults() {
    let scheduler = SchedulerBuilder::new().build().unwrap();
    assert!(scheduler.tasks().is_empty());
    assert_eq!(scheduler.group_concurrency("anything"), None);
}

#[tokio::test]
async fn test_builder_installs_configured_groups() {
    let config = SchedulerConfig {
        groups: HashMap::from([("alerts".to_string(), 2), ("reports".to_string(), 1)]),
        ..SchedulerConfig::default()
    };
    let scheduler = SchedulerBuilder::new()
        .config(config)
        .cron_evaluator(Arc::new(StandardCron))
        .clock(Arc::new(TokioClock::new()))
        .build()
        .unwrap();

    assert_eq!(scheduler.group_concurrency("alerts"), Some(2));
    assert_eq!(scheduler.group_concurrency("reports"), Some(1));
}

#[tokio::test]
async fn test_builder_rejects_invalid_config() {
    let config = SchedulerConfig {
        max_sleep_chunk_secs: 0,
        ..SchedulerConfig::default()
    };
    let err = SchedulerBuilder::new().config(config).build().unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidArgument { name: "config", .. }));
}

#[test]
fn test_builder_needs_a_runtime() {
    let err = SchedulerBuilder::new().build().unwrap_err();
    assert!(matches!(err, SchedulerError::Runtime(_)));
}

#[test]
fn test_builder_with_explicit_spawner_outside_runtime() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let scheduler = SchedulerBuilder::new()
        .spawner(TokioSpawner::new(rt.handle().clone()))
        .build()
        .unwrap();

    let id = scheduler
        .schedule_task_once(
            || async { Ok(()) },
            "* * * * *",
            cadence_scheduler::ScheduleOptions::new()
                .with_last_run(chrono::Utc::now() - chrono::Duration::hours(1)),
        )
        .unwrap();
    let outcome = rt.block_on(scheduler.get_promise(id).unwrap().outcome());
    assert_eq!(outcome, cadence_scheduler::RunOutcome::Completed);
}
