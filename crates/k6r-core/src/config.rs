use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use k6r_model::RunId;

use crate::error::CoreError;

/// What a bounded submission queue does when it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Fail the submission with [`CoreError::QueueFull`].
    #[default]
    Reject,
    /// Wait until a worker frees a slot.
    Block,
}

/// Submission queue sizing.
///
/// `capacity = None` keeps the queue unbounded: submissions never fail because of load,
/// at the price of unbounded memory under sustained overload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueueConfig {
    pub capacity: Option<usize>,
    pub overflow: OverflowPolicy,
}

impl QueueConfig {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(capacity: usize, overflow: OverflowPolicy) -> Self {
        Self {
            capacity: Some(capacity),
            overflow,
        }
    }
}

/// Forwarding of container output to the operator log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    /// Max line length before truncation.
    pub max_line_length: usize,
    /// Frames buffered between the stream pump and the log forwarder; overflow is dropped.
    pub buffer_frames: usize,
    /// Log stdout at INFO level (false = DEBUG).
    pub stdout_info: bool,
    /// Log stderr at WARN level (false = DEBUG).
    pub stderr_warn: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_line_length: 4096,
            buffer_frames: 1024,
            stdout_info: true,
            stderr_warn: true,
        }
    }
}

/// Runner settings.
///
/// Defaults target the docker-compose layout the runner ships with:
/// a `k6` container sharing `/work` (scripts) and `/data/runs` (summaries).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunnerConfig {
    /// Container in which `k6 run` is executed.
    pub k6_container: String,
    /// The only base URL runs may target.
    pub allow_base_url: String,
    /// Prometheus remote-write endpoint handed to k6.
    pub prom_remote_write_url: String,
    /// Root directory holding the scripts, as seen by both the runner and the container.
    pub scripts_dir: PathBuf,
    /// Directory where k6 writes `<run-id>.json` summaries.
    pub results_dir: PathBuf,
    /// Number of workers, i.e. runs executing at the same time.
    pub max_concurrency: usize,
    pub queue: QueueConfig,
    /// Upper bound for a single execution. `None` waits for the runtime indefinitely.
    pub run_timeout_ms: Option<u64>,
    pub output: OutputConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            k6_container: "k6".to_string(),
            allow_base_url: "http://backend:8080".to_string(),
            prom_remote_write_url: "http://prometheus:9090/api/v1/write".to_string(),
            scripts_dir: PathBuf::from("/work"),
            results_dir: PathBuf::from("/data/runs"),
            max_concurrency: 1,
            queue: QueueConfig::default(),
            run_timeout_ms: None,
            output: OutputConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Worker count; a configured zero still yields one worker.
    pub fn workers(&self) -> usize {
        self.max_concurrency.max(1)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_ms.map(Duration::from_millis)
    }

    /// Deterministic location of the summary artifact for `id`.
    pub fn summary_path(&self, id: &RunId) -> PathBuf {
        self.results_dir.join(format!("{id}.json"))
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.k6_container.trim().is_empty() {
            return Err(CoreError::Config("k6Container cannot be empty".into()));
        }
        if self.allow_base_url.trim().is_empty() {
            return Err(CoreError::Config("allowBaseUrl cannot be empty".into()));
        }
        if self.queue.capacity == Some(0) {
            return Err(CoreError::Config("queue.capacity cannot be zero".into()));
        }
        if self.run_timeout_ms == Some(0) {
            return Err(CoreError::Config("runTimeoutMs cannot be zero".into()));
        }
        if self.output.buffer_frames == 0 {
            return Err(CoreError::Config("output.bufferFrames cannot be zero".into()));
        }
        Ok(())
    }
}
