//! Run orchestration for k6 load tests.
//!
//! Submissions pass [`admission`], are recorded in the [`registry`], and are executed by the
//! [`scheduler`] worker pool against an [`ExecBackend`](runtime::ExecBackend).
//! [`RunService`] ties these together for front ends.
pub mod admission;
pub mod config;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod service;

pub use admission::{JobSpec, ValidationError};
pub use config::{OutputConfig, OverflowPolicy, QueueConfig, RunnerConfig};
pub use error::{CoreError, NotFoundError};
pub use metrics::{ActiveGauge, ActiveRuns, MetricsBackend, MetricsHandle, NoOpMetrics, noop_metrics};
pub use registry::{RegistryError, RunRegistry};
pub use runtime::{
    Completion, ExecBackend, ExecHandle, ExecId, ExecRequest, OutputFrame, OutputKind,
    OutputStream, RuntimeError,
};
pub use service::RunService;

pub mod prelude {
    pub use crate::config::RunnerConfig;
    pub use crate::error::{CoreError, NotFoundError};
    pub use crate::metrics::{MetricsBackend, MetricsHandle};
    pub use crate::runtime::{ExecBackend, ExecHandle, RuntimeError};
    pub use crate::service::RunService;
}
