//! Error types for scheduler operations.

use thiserror::Error;

use crate::core::task::TaskId;

/// Errors produced by scheduler components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Bad input rejected before anything was registered.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// The scheduled function failed (or panicked) during one run.
    #[error("task execution failed: {0}")]
    TaskExecution(String),
    /// The id was issued but the task has since been purged.
    #[error("task #{0} is not available anymore (the task was purged)")]
    UnavailableTask(TaskId),
    /// The id was never issued by this scheduler.
    #[error("task id #{0} is not valid")]
    InvalidTaskId(TaskId),
    /// No async runtime is available to drive tasks.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl SchedulerError {
    /// Shorthand for [`SchedulerError::InvalidArgument`].
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// Result alias for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Application-facing result using anyhow; scheduled functions return this.
pub type AppResult<T> = std::result::Result<T, anyhow::Error>;
