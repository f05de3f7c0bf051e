//! # Cadence Scheduler
//!
//! An in-process, cron-driven task scheduler for tokio applications, with the
//! two bounded-resource primitives it is built on.
//!
//! ## Core Problem Solved
//!
//! Background jobs (alert checks, report generation, cache refreshes) need to
//! run on a calendar, survive their own failures, and not stampede shared
//! resources:
//!
//! - **Calendar Time**: runs are computed from standard 5-field cron
//!   expressions, with catch-up when the last run is overdue
//! - **Bounded Concurrency**: tasks sharing a group never run more than the
//!   group's limit at once; queued tasks are served first-in first-out
//! - **Failure Isolation**: a task that errors or panics never affects the
//!   scheduler or its siblings
//! - **Bounded Memory**: tracked entities are capped with deterministic
//!   least-recently-used eviction
//!
//! ## Key Components
//!
//! - [`Scheduler`]: task registry, cron timing, cooperative cancellation
//! - [`Semaphore`]: async counting semaphore with a FIFO waiter queue
//! - [`CappedQueue`]: bounded, touch-ordered set that evicts the oldest value
//! - [`infra::BoundedCache`]: LRU map built on a `CappedQueue`
//!
//! ## Scheduling
//!
//! ```rust,no_run
//! use cadence_scheduler::{ScheduleOptions, Scheduler};
//! use chrono::{Duration, Utc};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = Scheduler::new()?;
//! scheduler.set_group_concurrency("alerts", Some(2))?;
//!
//! // Last ran two days ago: midnight has passed since, so this runs now.
//! let id = scheduler.schedule_task_once(
//!     || async { Ok(()) },
//!     "0 0 * * *",
//!     ScheduleOptions::new()
//!         .with_last_run(Utc::now() - Duration::days(2))
//!         .with_group("alerts"),
//! )?;
//!
//! let outcome = scheduler.get_promise(id)?.await;
//! outcome.into_result()?;
//! # Ok(())
//! # }
//! ```
//!
//! Configuration can come from JSON or the environment
//! ([`config::SchedulerConfig::from_env`]) and is applied through
//! [`builders::SchedulerBuilder`].

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: tasks, cron, timers and the scheduler.
pub mod core;
/// Configuration models for timing and group limits.
pub mod config;
/// Builders to construct a scheduler from configuration.
pub mod builders;
/// In-memory infrastructure such as the bounded cache.
pub mod infra;
/// Runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
/// Capped, insertion-ordered eviction queue.
pub mod capped_queue;
/// Async counting semaphore.
pub mod semaphore;

pub use crate::capped_queue::CappedQueue;
pub use crate::core::{
    AppResult, RunHandle, RunOutcome, ScheduleOptions, Scheduler, SchedulerError, TaskId,
    TaskSnapshot, TaskStatus,
};
pub use crate::semaphore::Semaphore;
