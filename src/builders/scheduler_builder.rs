//! Builder assembling a [`Scheduler`] from configuration and collaborators.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::audit::AuditSink;
use crate::core::cron::{CronEvaluator, StandardCron};
use crate::core::error::{Result, SchedulerError};
use crate::core::scheduler::{Scheduler, SchedulerParts};
use crate::runtime::TokioSpawner;
use crate::util::clock::{Clock, SystemClock};

/// Configures and builds a [`Scheduler`].
///
/// Unset collaborators default to [`StandardCron`], [`SystemClock`] and a
/// spawner on the current tokio runtime.
#[derive(Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    cron: Option<Arc<dyn CronEvaluator>>,
    clock: Option<Arc<dyn Clock>>,
    spawner: Option<TokioSpawner>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl SchedulerBuilder {
    /// Builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` for timing and initial group limits.
    #[must_use]
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom cron evaluator.
    #[must_use]
    pub fn cron_evaluator(mut self, cron: Arc<dyn CronEvaluator>) -> Self {
        self.cron = Some(cron);
        self
    }

    /// Use a custom clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Drive tasks on a specific runtime.
    #[must_use]
    pub fn spawner(mut self, spawner: TokioSpawner) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Report task lifecycle transitions to `audit`.
    #[must_use]
    pub fn audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Validate the configuration and build the scheduler.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidArgument`] for invalid configuration;
    /// [`SchedulerError::Runtime`] when no spawner was given and there is no
    /// current tokio runtime.
    pub fn build(self) -> Result<Scheduler> {
        self.config
            .validate()
            .map_err(|e| SchedulerError::invalid_argument("config", e))?;
        let reference_offset = chrono::Duration::from_std(self.config.reference_offset())
            .map_err(|e| SchedulerError::invalid_argument("reference_offset_ms", e.to_string()))?;
        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => TokioSpawner::try_current()?,
        };

        let scheduler = Scheduler::from_parts(SchedulerParts {
            cron: self.cron.unwrap_or_else(|| Arc::new(StandardCron)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            spawner,
            audit: self.audit,
            max_sleep_chunk: self.config.max_sleep_chunk(),
            reference_offset,
        });
        for (group, concurrency) in &self.config.groups {
            scheduler.set_group_concurrency(group, Some(*concurrency))?;
        }
        Ok(scheduler)
    }
}
