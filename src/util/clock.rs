//! Wall-clock sources used by the scheduler.
//!
//! Cron instants are wall-clock instants, but sleeping happens on tokio's
//! timer. A [`Clock`] ties the two together.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of "now" plus a way to suspend for a duration.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current wall-clock instant.
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// System wall clock with tokio's timer. The default for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Wall clock derived from tokio's monotonic clock.
///
/// Captures the wall-clock time once at construction and advances it with
/// `tokio::time::Instant`, so it follows tokio's paused clock in tests
/// (`#[tokio::test(start_paused = true)]`). Construct it inside the runtime.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    anchor_wall: DateTime<Utc>,
    anchor_instant: tokio::time::Instant,
}

impl TokioClock {
    /// Anchor a new clock at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            anchor_wall: Utc::now(),
            anchor_instant: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.anchor_instant.elapsed();
        chrono::Duration::from_std(elapsed)
            .map_or(self.anchor_wall, |elapsed| self.anchor_wall + elapsed)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
