//! Task identifiers, lifecycle states, scheduling options and run outcomes.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::core::error::{Result, SchedulerError};

/// Scheduler-issued task identifier. Strictly increasing, never reused.
pub type TaskId = u64;

/// Lifecycle state of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Sleeping until its next run instant, or queued on its group.
    Waiting,
    /// The task function is executing.
    Running,
    /// Cancelled; no further run will start.
    Cancelled,
    /// The id was issued but the task has been purged from the registry.
    Unavailable,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Cancelled => "cancelled",
            Self::Unavailable => "unavailable",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "running" => Ok(Self::Running),
            "cancelled" => Ok(Self::Cancelled),
            "unavailable" => Ok(Self::Unavailable),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// Options accepted by `schedule_task_once` and `schedule_task`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    /// Reference instant for the first run. Defaults to now.
    ///
    /// A `last_run` older than the previous cron occurrence makes the first
    /// run happen right away (catch-up).
    pub last_run: Option<DateTime<Utc>>,
    /// Concurrency group; see `Scheduler::set_group_concurrency`.
    pub group: Option<String>,
    /// Stop a recurring task after its first failed run.
    #[serde(default)]
    pub cancel_on_error: bool,
}

impl ScheduleOptions {
    /// Empty options: reference now, no group, keep running on errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reference instant for the first run.
    #[must_use]
    pub fn with_last_run(mut self, last_run: DateTime<Utc>) -> Self {
        self.last_run = Some(last_run);
        self
    }

    /// Run inside the given concurrency group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Stop the recurring loop on the first failed run.
    #[must_use]
    pub fn with_cancel_on_error(mut self, cancel_on_error: bool) -> Self {
        self.cancel_on_error = cancel_on_error;
        self
    }
}

/// How one run of a task settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The function returned `Ok`.
    Completed,
    /// The function returned an error or panicked.
    Failed(String),
    /// The run was cancelled before the function was invoked.
    Cancelled,
}

impl RunOutcome {
    /// Map the outcome to a result; a failure becomes
    /// [`SchedulerError::TaskExecution`].
    ///
    /// # Errors
    ///
    /// Returns the task's error message for [`RunOutcome::Failed`].
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Completed | Self::Cancelled => Ok(()),
            Self::Failed(message) => Err(SchedulerError::TaskExecution(message)),
        }
    }
}

/// Awaitable handle on the outcome of a task's current or most recent run.
#[derive(Debug, Clone)]
pub struct RunHandle {
    receiver: watch::Receiver<Option<RunOutcome>>,
}

impl RunHandle {
    pub(crate) const fn new(receiver: watch::Receiver<Option<RunOutcome>>) -> Self {
        Self { receiver }
    }

    /// The outcome if the run already settled.
    #[must_use]
    pub fn try_outcome(&self) -> Option<RunOutcome> {
        self.receiver.borrow().clone()
    }

    /// Wait for the run to settle.
    ///
    /// A run abandoned without an outcome (its driver went away, e.g. on
    /// runtime shutdown) reads as [`RunOutcome::Cancelled`].
    pub async fn outcome(mut self) -> RunOutcome {
        match self.receiver.wait_for(Option::is_some).await {
            Ok(settled) => settled.clone().unwrap_or(RunOutcome::Cancelled),
            Err(_) => RunOutcome::Cancelled,
        }
    }
}

impl IntoFuture for RunHandle {
    type Output = RunOutcome;
    type IntoFuture = Pin<Box<dyn Future<Output = RunOutcome> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.outcome())
    }
}

/// Serializable view of a registered task, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Task identifier.
    pub id: TaskId,
    /// Live status.
    pub status: TaskStatus,
    /// Next (or current) run instant.
    pub time_to_schedule: DateTime<Utc>,
    /// Concurrency group, if any.
    pub group: Option<String>,
    /// Whether the task repeats.
    pub recurring: bool,
}
