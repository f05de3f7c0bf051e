//! Tokio runtime spawner implementation.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::core::error::{Result, SchedulerError};

/// Tokio-based spawner that drives scheduled tasks on a tokio runtime.
///
/// Holding a [`Handle`] lets tasks be registered from synchronous code
/// running outside the runtime.
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    handle: Handle,
}

impl TokioSpawner {
    /// Create a `TokioSpawner` from a tokio runtime handle.
    #[must_use]
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Spawner for the runtime the caller is currently running on.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::Runtime`] when called outside a tokio runtime.
    pub fn try_current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| SchedulerError::Runtime(e.to_string()))
    }

    /// Spawn a future onto the runtime.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(fut)
    }
}
