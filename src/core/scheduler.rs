//! Cron-driven task scheduler with per-group concurrency limits.
//!
//! Every registered task is driven by one background future that loops:
//! sleep until the next cron instant, acquire the task's group semaphore (if
//! the group has a limit), invoke the task function, release, and either
//! re-arm (recurring tasks) or purge the task from the registry.
//!
//! Cancellation is cooperative. A [`CancellationToken`] per task is checked
//! while sleeping, while queued on the group semaphore and before re-arming;
//! a function that already started is never interrupted.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::builders::SchedulerBuilder;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::cron::CronEvaluator;
use crate::core::error::{AppResult, Result, SchedulerError};
use crate::core::task::{RunHandle, RunOutcome, ScheduleOptions, TaskId, TaskSnapshot, TaskStatus};
use crate::core::timer::sleep_until;
use crate::runtime::TokioSpawner;
use crate::semaphore::Semaphore;
use crate::util::clock::Clock;

type RunFuture = Pin<Box<dyn Future<Output = AppResult<()>> + Send>>;
type TaskFn = Arc<dyn Fn() -> RunFuture + Send + Sync>;

struct TaskEntry {
    status: TaskStatus,
    time_to_schedule: DateTime<Utc>,
    group: Option<String>,
    recurring: bool,
    token: CancellationToken,
    outcome: watch::Receiver<Option<RunOutcome>>,
}

struct Registry {
    next_id: TaskId,
    tasks: HashMap<TaskId, TaskEntry>,
}

impl Registry {
    fn new() -> Self {
        Self {
            next_id: 1,
            tasks: HashMap::new(),
        }
    }

    const fn was_issued(&self, id: TaskId) -> bool {
        id >= 1 && id < self.next_id
    }
}

/// Collaborators and timing knobs a scheduler is assembled from.
pub(crate) struct SchedulerParts {
    pub cron: Arc<dyn CronEvaluator>,
    pub clock: Arc<dyn Clock>,
    pub spawner: TokioSpawner,
    pub audit: Option<Arc<dyn AuditSink>>,
    pub max_sleep_chunk: Duration,
    pub reference_offset: chrono::Duration,
}

struct Inner {
    registry: Mutex<Registry>,
    groups: Mutex<HashMap<String, Arc<Semaphore>>>,
    cron: Arc<dyn CronEvaluator>,
    clock: Arc<dyn Clock>,
    spawner: TokioSpawner,
    audit: Option<Arc<dyn AuditSink>>,
    max_sleep_chunk: Duration,
    reference_offset: chrono::Duration,
    shutdown: CancellationToken,
}

impl Inner {
    fn record(&self, id: TaskId, group: Option<&str>, action: AuditAction, detail: Option<String>) {
        if let Some(audit) = &self.audit {
            audit.record(build_audit_event(id, group, action, self.clock.now(), detail));
        }
    }

    fn group_semaphore(&self, group: Option<&str>) -> Option<Arc<Semaphore>> {
        group.and_then(|g| self.groups.lock().get(g).cloned())
    }

    /// `Waiting -> Running`; false if the task was cancelled meanwhile.
    fn mark_running(&self, id: TaskId) -> bool {
        let mut registry = self.registry.lock();
        match registry.tasks.get_mut(&id) {
            Some(entry) if entry.status == TaskStatus::Waiting => {
                entry.status = TaskStatus::Running;
                true
            }
            _ => false,
        }
    }

    /// Put a recurring task back to `Waiting` for its next run.
    fn rearm(
        &self,
        id: TaskId,
        next: DateTime<Utc>,
        outcome: watch::Receiver<Option<RunOutcome>>,
    ) -> bool {
        let mut registry = self.registry.lock();
        match registry.tasks.get_mut(&id) {
            Some(entry) if entry.status != TaskStatus::Cancelled => {
                entry.status = TaskStatus::Waiting;
                entry.time_to_schedule = next;
                entry.outcome = outcome;
                true
            }
            _ => false,
        }
    }

    fn purge(&self, id: TaskId, group: Option<&str>) {
        let removed = self.registry.lock().tasks.remove(&id).is_some();
        if removed {
            tracing::debug!(task_id = id, "task purged");
            self.record(id, group, AuditAction::Purged, None);
        }
    }
}

/// Schedules functions against cron expressions.
///
/// Cloning is cheap and every clone drives the same registry. Dropping the
/// last handle does not stop registered tasks; call [`Scheduler::shutdown`].
///
/// ```no_run
/// use cadence_scheduler::{ScheduleOptions, Scheduler};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), cadence_scheduler::SchedulerError> {
/// let scheduler = Scheduler::new()?;
/// scheduler.set_group_concurrency("reports", Some(1))?;
///
/// let id = scheduler.schedule_task(
///     || async {
///         tracing::info!("generating report");
///         Ok(())
///     },
///     "*/5 * * * *",
///     ScheduleOptions::new().with_group("reports"),
/// )?;
/// assert!(scheduler.get_status(id).is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Scheduler with default configuration on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::Runtime`] when called outside a tokio runtime.
    pub fn new() -> Result<Self> {
        SchedulerBuilder::new().build()
    }

    /// Start configuring a scheduler.
    #[must_use]
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn from_parts(parts: SchedulerParts) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry::new()),
                groups: Mutex::new(HashMap::new()),
                cron: parts.cron,
                clock: parts.clock,
                spawner: parts.spawner,
                audit: parts.audit,
                max_sleep_chunk: parts.max_sleep_chunk,
                reference_offset: parts.reference_offset,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Limit how many functions of `group` may run at once, or lift the
    /// limit with `None`.
    ///
    /// Replacing a limit while tasks are queued on the old one lets the old
    /// semaphore drain: queued tasks keep their place and run as its holders
    /// release. Tasks reaching the acquisition point afterwards use the new
    /// limit.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidArgument`] for an empty group name or a zero
    /// limit.
    pub fn set_group_concurrency(&self, group: &str, concurrency: Option<usize>) -> Result<()> {
        validate_group(group)?;
        let mut groups = self.inner.groups.lock();
        let retired = match concurrency {
            Some(n) => groups.insert(group.to_string(), Arc::new(Semaphore::new(n)?)),
            None => groups.remove(group),
        };
        drop(groups);

        match retired {
            Some(old) if old.active() > 0 || old.waiting() > 0 => tracing::info!(
                group,
                ?concurrency,
                active = old.active(),
                waiting = old.waiting(),
                "group concurrency changed, previous limit drains"
            ),
            _ => tracing::info!(group, ?concurrency, "group concurrency set"),
        }
        Ok(())
    }

    /// Current limit of `group`, if any.
    #[must_use]
    pub fn group_concurrency(&self, group: &str) -> Option<usize> {
        self.inner.groups.lock().get(group).map(|s| s.size())
    }

    /// Run `f` once at the next instant matching `cron`.
    ///
    /// The instant is computed from `options.last_run` (default now); when
    /// that lies in the past the function runs right away. Returns as soon
    /// as the task is registered.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidArgument`] for a malformed expression or an
    /// empty group name. Nothing is registered in that case.
    pub fn schedule_task_once<F, Fut>(&self, f: F, cron: &str, options: ScheduleOptions) -> Result<TaskId>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.register(boxed(f), cron, options, false)
    }

    /// Run `f` at every instant matching `cron` until cancelled.
    ///
    /// `options.last_run` only affects the first run; later runs are computed
    /// from the time the previous run settled. With `cancel_on_error` the
    /// loop ends after the first failed run.
    ///
    /// # Errors
    ///
    /// Same as [`Scheduler::schedule_task_once`].
    pub fn schedule_task<F, Fut>(&self, f: F, cron: &str, options: ScheduleOptions) -> Result<TaskId>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.register(boxed(f), cron, options, true)
    }

    fn register(&self, f: TaskFn, cron: &str, options: ScheduleOptions, recurring: bool) -> Result<TaskId> {
        if let Some(group) = &options.group {
            validate_group(group)?;
        }
        self.inner.cron.validate(cron)?;

        let reference = options
            .last_run
            .unwrap_or_else(|| self.inner.clock.now() + self.inner.reference_offset);
        let first = self.inner.cron.next_instant(cron, reference)?;

        let token = self.inner.shutdown.child_token();
        let (sender, receiver) = watch::channel(None);
        let id = {
            let mut registry = self.inner.registry.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.tasks.insert(
                id,
                TaskEntry {
                    status: if token.is_cancelled() {
                        TaskStatus::Cancelled
                    } else {
                        TaskStatus::Waiting
                    },
                    time_to_schedule: first,
                    group: options.group.clone(),
                    recurring,
                    token: token.clone(),
                    outcome: receiver,
                },
            );
            id
        };

        tracing::debug!(task_id = id, group = ?options.group, at = %first, recurring, "task scheduled");
        self.inner.record(
            id,
            options.group.as_deref(),
            AuditAction::Scheduled,
            Some(first.to_rfc3339()),
        );

        let driver = TaskDriver {
            inner: Arc::clone(&self.inner),
            id,
            f,
            cron: cron.to_string(),
            group: options.group,
            recurring,
            cancel_on_error: options.cancel_on_error,
            token,
            outcome: sender,
        };
        self.inner.spawner.spawn(driver.run(first));
        Ok(id)
    }

    /// Cancel a task. Returns whether a live task was found.
    ///
    /// A waiting task never runs; a running task finishes its current run
    /// but is not rescheduled. Unknown, purged and already cancelled ids
    /// return `false`.
    pub fn cancel(&self, id: TaskId) -> bool {
        let group = {
            let mut registry = self.inner.registry.lock();
            match registry.tasks.get_mut(&id) {
                Some(entry) if entry.status != TaskStatus::Cancelled => {
                    entry.status = TaskStatus::Cancelled;
                    entry.token.cancel();
                    entry.group.clone()
                }
                _ => return false,
            }
        };
        tracing::debug!(task_id = id, "task cancelled");
        self.inner.record(id, group.as_deref(), AuditAction::Cancelled, None);
        true
    }

    /// Next (or current) run instant of a task.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidTaskId`] for ids never issued,
    /// [`SchedulerError::UnavailableTask`] for purged ones.
    pub fn get_time_to_schedule(&self, id: TaskId) -> Result<DateTime<Utc>> {
        self.with_entry(id, |entry| entry.time_to_schedule)
    }

    /// Handle on the outcome of the task's current or most recent run.
    ///
    /// # Errors
    ///
    /// Same as [`Scheduler::get_time_to_schedule`].
    pub fn get_promise(&self, id: TaskId) -> Result<RunHandle> {
        self.with_entry(id, |entry| RunHandle::new(entry.outcome.clone()))
    }

    /// Live status; `Unavailable` once purged, `None` for ids never issued.
    #[must_use]
    pub fn get_status(&self, id: TaskId) -> Option<TaskStatus> {
        let registry = self.inner.registry.lock();
        match registry.tasks.get(&id) {
            Some(entry) => Some(entry.status),
            None if registry.was_issued(id) => Some(TaskStatus::Unavailable),
            None => None,
        }
    }

    /// Registered tasks ordered by id.
    #[must_use]
    pub fn tasks(&self) -> Vec<TaskSnapshot> {
        let registry = self.inner.registry.lock();
        let mut tasks: Vec<_> = registry
            .tasks
            .iter()
            .map(|(id, entry)| TaskSnapshot {
                id: *id,
                status: entry.status,
                time_to_schedule: entry.time_to_schedule,
                group: entry.group.clone(),
                recurring: entry.recurring,
            })
            .collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    /// Cancel every registered task, including ones scheduled later.
    pub fn shutdown(&self) {
        let cancelled: Vec<(TaskId, Option<String>)> = {
            let mut registry = self.inner.registry.lock();
            registry
                .tasks
                .iter_mut()
                .filter(|(_, entry)| entry.status != TaskStatus::Cancelled)
                .map(|(id, entry)| {
                    entry.status = TaskStatus::Cancelled;
                    (*id, entry.group.clone())
                })
                .collect()
        };
        self.inner.shutdown.cancel();
        tracing::info!(tasks = cancelled.len(), "scheduler shut down");
        for (id, group) in cancelled {
            self.inner.record(id, group.as_deref(), AuditAction::Cancelled, None);
        }
    }

    fn with_entry<T>(&self, id: TaskId, read: impl FnOnce(&TaskEntry) -> T) -> Result<T> {
        let registry = self.inner.registry.lock();
        match registry.tasks.get(&id) {
            Some(entry) => Ok(read(entry)),
            None if registry.was_issued(id) => Err(SchedulerError::UnavailableTask(id)),
            None => Err(SchedulerError::InvalidTaskId(id)),
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.lock();
        f.debug_struct("Scheduler")
            .field("tasks", &registry.tasks.len())
            .field("next_id", &registry.next_id)
            .field("groups", &self.inner.groups.lock().len())
            .finish_non_exhaustive()
    }
}

/// Background loop of one task.
struct TaskDriver {
    inner: Arc<Inner>,
    id: TaskId,
    f: TaskFn,
    cron: String,
    group: Option<String>,
    recurring: bool,
    cancel_on_error: bool,
    token: CancellationToken,
    outcome: watch::Sender<Option<RunOutcome>>,
}

impl TaskDriver {
    async fn run(mut self, first: DateTime<Utc>) {
        let mut instant = first;
        loop {
            let outcome = self.run_once(instant).await;
            let stop = match &outcome {
                RunOutcome::Completed => !self.recurring,
                RunOutcome::Failed(_) => !self.recurring || self.cancel_on_error,
                RunOutcome::Cancelled => true,
            };
            self.outcome.send_replace(Some(outcome));
            if stop || self.token.is_cancelled() {
                break;
            }

            let reference = self.inner.clock.now() + self.inner.reference_offset;
            let next = match self.inner.cron.next_instant(&self.cron, reference) {
                Ok(next) => next,
                Err(e) => {
                    tracing::warn!(task_id = self.id, error = %e, "no further run for recurring task");
                    break;
                }
            };
            let (sender, receiver) = watch::channel(None);
            if !self.inner.rearm(self.id, next, receiver) {
                break;
            }
            self.outcome = sender;
            instant = next;
            tracing::debug!(task_id = self.id, at = %next, "task rescheduled");
            self.inner.record(
                self.id,
                self.group.as_deref(),
                AuditAction::Scheduled,
                Some(next.to_rfc3339()),
            );
        }
        self.inner.purge(self.id, self.group.as_deref());
    }

    async fn run_once(&self, instant: DateTime<Utc>) -> RunOutcome {
        let inner = &self.inner;
        if !sleep_until(inner.clock.as_ref(), instant, inner.max_sleep_chunk, &self.token).await {
            return RunOutcome::Cancelled;
        }

        let semaphore = inner.group_semaphore(self.group.as_deref());
        if let Some(semaphore) = &semaphore {
            tokio::select! {
                biased;
                () = self.token.cancelled() => return RunOutcome::Cancelled,
                () = semaphore.acquire() => {}
            }
        }

        if !inner.mark_running(self.id) {
            if let Some(semaphore) = &semaphore {
                semaphore.release();
            }
            return RunOutcome::Cancelled;
        }
        tracing::debug!(task_id = self.id, group = ?self.group, "task running");
        inner.record(self.id, self.group.as_deref(), AuditAction::Started, None);

        let f = Arc::clone(&self.f);
        let settled = inner.spawner.spawn(async move { f().await }).await;
        if let Some(semaphore) = &semaphore {
            semaphore.release();
        }

        let failure = match settled {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("{e:#}")),
            Err(e) => Some(join_failure(e)),
        };
        match failure {
            None => {
                tracing::debug!(task_id = self.id, "task completed");
                inner.record(self.id, self.group.as_deref(), AuditAction::Completed, None);
                RunOutcome::Completed
            }
            Some(message) => {
                tracing::error!(task_id = self.id, group = ?self.group, error = %message, "task failed");
                inner.record(
                    self.id,
                    self.group.as_deref(),
                    AuditAction::Failed,
                    Some(message.clone()),
                );
                RunOutcome::Failed(message)
            }
        }
    }
}

fn boxed<F, Fut>(f: F) -> TaskFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    Arc::new(move || -> RunFuture { Box::pin(f()) })
}

fn validate_group(group: &str) -> Result<()> {
    if group.trim().is_empty() {
        return Err(SchedulerError::invalid_argument(
            "group",
            "group name must not be empty",
        ));
    }
    Ok(())
}

fn join_failure(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .map_or_else(|| "task panicked".to_string(), |msg| format!("task panicked: {msg}"))
}
