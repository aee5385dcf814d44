//! Prometheus metrics backend for the k6 run orchestrator.
//!
//! [`PrometheusMetrics`] implements [`k6r_core::MetricsBackend`]; hand it to
//! [`k6r_core::RunService::new`] and serve [`PrometheusMetrics::gather`] from a `/metrics` route.
//!
//! ## Metrics
//! - `k6_runs_started_total` - Counter
//! - `k6_runs_succeeded_total` - Counter
//! - `k6_runs_failed_total` - Counter
//! - `k6_runs_active` - Gauge, read from the core's active-run counter at scrape time
//! - `k6_run_duration_seconds` - Histogram
//! - `k6_runner_errors_total{error_kind}` - Counter
//!
//! ## Example
//! ```rust
//! use k6r_core::MetricsBackend;
//! use k6r_prometheus::{Encoder, PrometheusMetrics, TextEncoder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! metrics.record_run_started();
//!
//! let mut buf = Vec::new();
//! TextEncoder::new().encode(&metrics.gather(), &mut buf)?;
//! assert!(String::from_utf8(buf)?.contains("k6_runs_started_total 1"));
//! # Ok(())
//! # }
//! ```
//!
//! ## HTTP Server
//! No HTTP server here; the binary encodes the gathered families with [`TextEncoder`].
mod active;

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
