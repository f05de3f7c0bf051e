//! Async counting semaphore with a FIFO waiter queue.
//!
//! [`Semaphore::acquire`] resolves immediately while fewer than `size` slots
//! are held, otherwise it parks the caller at the back of the waiter queue.
//! [`Semaphore::release`] hands the freed slot directly to the oldest waiter,
//! so `active` does not change on a hand-off.
//!
//! There is no timeout and no priority. Acquire and release are not tied
//! together by a guard: whoever acquires is responsible for releasing.
//!
//! # Examples
//!
//! ```
//! use cadence_scheduler::Semaphore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), cadence_scheduler::SchedulerError> {
//! let semaphore = Semaphore::new(1)?;
//!
//! semaphore.acquire().await;
//! assert!(!semaphore.try_acquire());
//! semaphore.release();
//! assert_eq!(semaphore.active(), 0);
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::core::error::{Result, SchedulerError};

struct SemaphoreState {
    active: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
}

impl SemaphoreState {
    fn live_waiters(&self) -> usize {
        self.waiters.iter().filter(|w| !w.is_closed()).count()
    }

    fn prune_closed(&mut self) {
        self.waiters.retain(|w| !w.is_closed());
    }
}

/// Counting semaphore bounding concurrent holders to `size`.
pub struct Semaphore {
    size: usize,
    state: Mutex<SemaphoreState>,
}

impl Semaphore {
    /// Create a semaphore with `size` slots.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidArgument`] when `size` is zero.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(SchedulerError::invalid_argument(
                "size",
                "a semaphore needs at least one slot",
            ));
        }
        Ok(Self {
            size,
            state: Mutex::new(SemaphoreState {
                active: 0,
                waiters: VecDeque::new(),
            }),
        })
    }

    /// Acquire a slot, suspending until one is free.
    ///
    /// Dropping the returned future before it resolves gives up the place in
    /// the queue; a slot handed over in the meantime is passed on.
    pub async fn acquire(&self) {
        let receiver = {
            let mut state = self.state.lock();
            if state.active < self.size {
                state.active += 1;
                return;
            }
            let (sender, receiver) = oneshot::channel();
            state.prune_closed();
            state.waiters.push_back(sender);
            receiver
        };

        let mut waiter = Waiter {
            semaphore: self,
            receiver: Some(receiver),
        };
        if let Some(receiver) = waiter.receiver.as_mut() {
            // Err only if the sender is dropped, which `release` never does
            // for a live receiver.
            let _ = receiver.await;
        }
        waiter.receiver = None;
    }

    /// Take a slot if one is free right now.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if state.active < self.size {
            state.active += 1;
            true
        } else {
            false
        }
    }

    /// Release a slot, waking the oldest waiter if any.
    ///
    /// Calling this without a matching acquire is a programming error; it is
    /// logged and leaves the counters untouched.
    pub fn release(&self) {
        let mut state = self.state.lock();
        while let Some(waiter) = state.waiters.pop_front() {
            // one holder leaves, one enters: `active` is unchanged
            if waiter.send(()).is_ok() {
                return;
            }
        }
        if state.active > 0 {
            state.active -= 1;
        } else {
            tracing::error!(size = self.size, "semaphore released without a matching acquire");
        }
    }

    /// Configured number of slots.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Slots currently held.
    #[must_use]
    pub fn active(&self) -> usize {
        self.state.lock().active
    }

    /// Callers currently parked in `acquire`.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.state.lock().live_waiters()
    }
}

impl Default for Semaphore {
    /// A single-slot semaphore, usable as an async mutex.
    fn default() -> Self {
        Self {
            size: 1,
            state: Mutex::new(SemaphoreState {
                active: 0,
                waiters: VecDeque::new(),
            }),
        }
    }
}

impl std::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Semaphore")
            .field("size", &self.size)
            .field("active", &state.active)
            .field("waiters", &state.live_waiters())
            .finish()
    }
}

/// Parked `acquire` call; returns a slot it was handed if dropped early.
struct Waiter<'a> {
    semaphore: &'a Semaphore,
    receiver: Option<oneshot::Receiver<()>>,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
            if receiver.try_recv().is_ok() {
                self.semaphore.release();
            } else {
                self.semaphore.state.lock().prune_closed();
            }
        }
    }
}
