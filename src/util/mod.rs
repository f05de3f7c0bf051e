//! Shared utilities.

pub mod clock;
pub mod telemetry;

pub use clock::{Clock, SystemClock, TokioClock};
pub use telemetry::init_tracing;
