//! Core scheduling abstractions: tasks, cron evaluation, timers and the
//! scheduler itself.

pub mod audit;
pub mod cron;
pub mod error;
pub mod scheduler;
pub mod task;
pub mod timer;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use cron::{CronEvaluator, StandardCron, MAX_EXPRESSION_LEN};
pub use error::{AppResult, Result, SchedulerError};
pub use scheduler::Scheduler;
pub use task::{RunHandle, RunOutcome, ScheduleOptions, TaskId, TaskSnapshot, TaskStatus};
pub use timer::sleep_until;
