//! Cancellable sleeping until a wall-clock instant.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::util::clock::Clock;

/// Sleep until `instant` on `clock`, in chunks of at most `max_chunk`.
///
/// The clock is re-read after every chunk, so wall-clock adjustments during
/// a long wait are picked up. Returns `false` if `token` was cancelled first
/// and `true` once the instant is reached (immediately if already past).
pub async fn sleep_until(
    clock: &dyn Clock,
    instant: DateTime<Utc>,
    max_chunk: Duration,
    token: &CancellationToken,
) -> bool {
    loop {
        if token.is_cancelled() {
            return false;
        }
        let Ok(remaining) = (instant - clock.now()).to_std() else {
            // negative: the instant has passed
            return true;
        };
        if remaining.is_zero() {
            return true;
        }

        tokio::select! {
            biased;
            () = token.cancelled() => return false,
            () = clock.sleep(remaining.min(max_chunk)) => {}
        }
    }
}
