use std::sync::Arc;

use k6r_model::RunOutcome;

/// Read callback returning the current number of executing runs.
pub type ActiveGauge = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Sink for run lifecycle metrics.
pub trait MetricsBackend: Send + Sync + 'static {
    /// A worker picked up a run and moved it to `RUNNING`.
    fn record_run_started(&self);
    /// A run reached a terminal state.
    ///
    /// Called exactly once per started run, whatever the exit path.
    ///
    /// # Arguments
    /// - `outcome`: terminal classification
    /// - `duration_ms`: time spent executing, in milliseconds
    fn record_run_completed(&self, outcome: RunOutcome, duration_ms: u64);
    /// The execution adapter failed (create, start, inspect, timeout, interruption).
    ///
    /// This is in addition to `record_run_completed` with [`RunOutcome::Failed`].
    ///
    /// # Arguments
    /// - `error_kind`: bounded error category, e.g. `"create_failed"`
    fn record_runner_error(&self, error_kind: &str);
    /// Attach the callback the backend reads when exporting the active-run gauge.
    fn bind_active_gauge(&self, gauge: ActiveGauge);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
