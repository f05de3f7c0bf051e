//! Audit sink implementations.
//!
//! The scheduler reports every task lifecycle transition to an optional
//! [`AuditSink`]. The in-memory sink keeps a bounded window of recent events
//! for admin views and tests.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::task::TaskId;

/// Lifecycle transition being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Task registered (or re-armed for its next run).
    Scheduled,
    /// Task function invoked.
    Started,
    /// Task function returned `Ok`.
    Completed,
    /// Task function returned an error or panicked.
    Failed,
    /// Task cancelled by a caller or by shutdown.
    Cancelled,
    /// Task removed from the registry.
    Purged,
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Related task identifier.
    pub task_id: TaskId,
    /// Concurrency group of the task, if any.
    pub group: Option<String>,
    /// Transition taken.
    pub action: AuditAction,
    /// When the transition happened.
    pub at: DateTime<Utc>,
    /// Additional context (error message, next run instant).
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Events recorded for one task, oldest first.
    #[must_use]
    pub fn events_for(&self, task_id: TaskId) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.task_id == task_id)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    task_id: TaskId,
    group: Option<&str>,
    action: AuditAction,
    at: DateTime<Utc>,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        task_id,
        group: group.map(str::to_string),
        action,
        at,
        detail,
    }
}
