use k6r_model::RunOutcome;

use crate::metrics::backend::{ActiveGauge, MetricsBackend};

/// Metrics backend that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_run_started(&self) {}

    #[inline(always)]
    fn record_run_completed(&self, _: RunOutcome, _: u64) {}

    #[inline(always)]
    fn record_runner_error(&self, _: &str) {}

    #[inline(always)]
    fn bind_active_gauge(&self, _: ActiveGauge) {}
}
