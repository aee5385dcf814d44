use std::sync::{Arc, OnceLock};

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, proto::MetricFamily,
};

use k6r_core::{ActiveGauge, MetricsBackend};
use k6r_model::RunOutcome;

use crate::active::ActiveCollector;

/// Prometheus metrics backend for k6 runs.
///
/// ## Label cardinality
/// Only `k6_runner_errors_total` carries a label; `error_kind` is bounded
/// ("create_failed", "start_failed", "inspect_failed", "timeout", "interrupted", ...).
#[derive(Clone)]
pub struct PrometheusMetrics {
    runs_started: IntCounter,
    runs_succeeded: IntCounter,
    runs_failed: IntCounter,
    run_duration: Histogram,
    runner_errors: IntCounterVec,
    active: Arc<OnceLock<ActiveGauge>>,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Create a new prometheus metrics backend with custom registry.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let runs_started = IntCounter::new("k6_runs_started_total", "Total number of runs started")?;
        registry.register(Box::new(runs_started.clone()))?;

        let runs_succeeded = IntCounter::new(
            "k6_runs_succeeded_total",
            "Total number of runs that exited with code 0",
        )?;
        registry.register(Box::new(runs_succeeded.clone()))?;

        let runs_failed = IntCounter::new("k6_runs_failed_total", "Total number of failed runs")?;
        registry.register(Box::new(runs_failed.clone()))?;

        let run_duration = Histogram::with_opts(
            HistogramOpts::new("k6_run_duration_seconds", "Run execution duration in seconds")
                .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        )?;
        registry.register(Box::new(run_duration.clone()))?;

        let runner_errors = IntCounterVec::new(
            Opts::new("k6_runner_errors_total", "Total execution adapter errors"),
            &["error_kind"],
        )?;
        registry.register(Box::new(runner_errors.clone()))?;

        let active = Arc::new(OnceLock::new());
        registry.register(Box::new(ActiveCollector::new(Arc::clone(&active))?))?;

        Ok(Self {
            runs_started,
            runs_succeeded,
            runs_failed,
            run_duration,
            runner_errors,
            active,
            registry,
        })
    }

    /// Create a new prometheus metrics backend with default registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metrics for exposition.
    ///
    /// # Example
    /// ```rust,ignore
    /// let families = metrics.gather();
    /// TextEncoder::new().encode(&families, &mut buffer)?;
    /// ```
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_run_started(&self) {
        self.runs_started.inc();
    }

    fn record_run_completed(&self, outcome: RunOutcome, duration_ms: u64) {
        match outcome {
            RunOutcome::Succeeded => self.runs_succeeded.inc(),
            RunOutcome::Failed => self.runs_failed.inc(),
        }
        self.run_duration.observe(duration_ms as f64 / 1000.0);
    }

    fn record_runner_error(&self, error_kind: &str) {
        self.runner_errors.with_label_values(&[error_kind]).inc();
    }

    /// Only the first binding is kept.
    fn bind_active_gauge(&self, gauge: ActiveGauge) {
        let _ = self.active.set(gauge);
    }
}
