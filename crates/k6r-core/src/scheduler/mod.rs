//! Fixed-size worker pool draining the submission queue.
//!
//! `max_concurrency` workers share one receiver; each takes a job, drives it through
//! [`crate::runtime::execute`] and finalizes the record before taking the next one, so no more
//! than `max_concurrency` runs are ever `RUNNING`.
mod queue;
pub use queue::Slot;

mod worker;

use std::{
    fmt,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::{sync::Mutex as AsyncMutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use k6r_model::RunId;

use crate::{
    admission::JobSpec,
    config::RunnerConfig,
    error::CoreError,
    metrics::{ActiveRuns, MetricsHandle},
    registry::RunRegistry,
    runtime::ExecHandle,
};

use queue::{JobReceiver, JobSender};

/// A registered run waiting for a worker.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: RunId,
    pub spec: JobSpec,
    pub summary_path: PathBuf,
}

/// Everything a worker needs to execute and finalize runs.
#[derive(Clone)]
pub struct WorkerContext {
    pub cfg: Arc<RunnerConfig>,
    pub registry: Arc<RunRegistry>,
    pub backend: ExecHandle,
    pub metrics: MetricsHandle,
    pub active: ActiveRuns,
}

impl fmt::Debug for WorkerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerContext")
            .field("workers", &self.cfg.workers())
            .field("backend", &self.backend.name())
            .field("metrics", &"<handle>")
            .field("active", &self.active.current())
            .finish()
    }
}

pub struct WorkerPool {
    sender: JobSender,
    // Held so the queue stays open after the workers exit.
    _receiver: Arc<AsyncMutex<JobReceiver>>,
    cancel: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `cfg.workers()` workers on the current tokio runtime.
    pub fn spawn(ctx: WorkerContext) -> Self {
        let (sender, receiver) = queue::channel(ctx.cfg.queue);
        let receiver = Arc::new(AsyncMutex::new(receiver));
        let cancel = CancellationToken::new();
        let count = ctx.cfg.workers();

        let ctx = Arc::new(ctx);
        let workers = (0..count)
            .map(|idx| {
                tokio::spawn(worker::worker_loop(
                    idx,
                    Arc::clone(&ctx),
                    Arc::clone(&receiver),
                    cancel.clone(),
                ))
            })
            .collect();
        info!(workers = count, queue = ?ctx.cfg.queue, "worker pool started");

        Self {
            sender,
            _receiver: receiver,
            cancel,
            workers: Mutex::new(workers),
        }
    }

    /// Reserve a queue slot for a submission about to be registered.
    pub async fn reserve(&self) -> Result<Slot<'_>, CoreError> {
        if self.is_shutting_down() {
            return Err(CoreError::ShuttingDown);
        }
        self.sender.reserve(&self.cancel).await
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop all workers and wait for them to exit.
    ///
    /// In-flight runs are finalized as `FAILED`; runs still waiting in the queue stay `QUEUED`.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let workers =
            std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in workers {
            if let Err(e) = handle.await {
                debug!(error = %e, "worker join failed");
            }
        }
        info!("worker pool stopped");
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("shutting_down", &self.is_shutting_down())
            .finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
