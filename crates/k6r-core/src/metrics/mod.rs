//! Metrics collection abstraction for runs.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are handed to
//! [`crate::RunService`]. The active-run count is owned by the core ([`ActiveRuns`]) and exposed
//! to backends as a read callback rather than pushed.
mod backend;
pub use backend::{ActiveGauge, MetricsBackend, MetricsHandle};

mod noop;
pub use noop::NoOpMetrics;

mod active;
pub use active::{ActiveGuard, ActiveRuns};

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
