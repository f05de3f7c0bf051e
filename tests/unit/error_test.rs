//! Tests for error types

use cadence_scheduler::core::SchedulerError;

#[test]
fn test_invalid_argument_error() {
    let err = SchedulerError::invalid_argument("cron", "`x` must be a valid cron");
    assert_eq!(
        format!("{}", err),
        "invalid argument `cron`: `x` must be a valid cron"
    );
}

#[test]
fn test_task_execution_error() {
    let err = SchedulerError::TaskExecution("disk full".to_string());
    assert_eq!(format!("{}", err), "task execution failed: disk full");
}

#[test]
fn test_unavailable_task_error() {
    let err = SchedulerError::UnavailableTask(3);
    assert_eq!(
        format!("{}", err),
        "task #3 is not available anymore (the task was purged)"
    );
}

#[test]
fn test_invalid_task_id_error() {
    let err = SchedulerError::InvalidTaskId(9);
    assert_eq!(format!("{}", err), "task id #9 is not valid");
}

#[test]
fn test_runtime_error_converts_to_anyhow() {
    let err: anyhow::Error = SchedulerError::Runtime("no reactor".into()).into();
    assert_eq!(err.to_string(), "runtime error: no reactor");
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
