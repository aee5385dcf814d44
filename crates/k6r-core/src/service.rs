//! Front-end facing facade over admission, registry and worker pool.
use std::{fmt, io, sync::Arc};

use time::OffsetDateTime;
use tracing::{debug, info, instrument};

use k6r_model::{RunId, RunRecord, StartRunRequest};

use crate::{
    admission::{self, JobSpec},
    config::RunnerConfig,
    error::{CoreError, NotFoundError},
    metrics::{ActiveRuns, MetricsHandle},
    registry::{RegistryError, RunRegistry},
    runtime::ExecHandle,
    scheduler::{Job, WorkerContext, WorkerPool},
};

/// Attempts at drawing a fresh run id before giving up on a submission.
const MAX_ID_ATTEMPTS: usize = 8;

/// Run orchestrator: accepts submissions, executes them on the worker pool and answers queries.
pub struct RunService {
    cfg: Arc<RunnerConfig>,
    registry: Arc<RunRegistry>,
    active: ActiveRuns,
    pool: WorkerPool,
}

impl RunService {
    /// Validate `cfg`, spawn the worker pool and bind the active-run gauge to `metrics`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        cfg: RunnerConfig,
        backend: ExecHandle,
        metrics: MetricsHandle,
    ) -> Result<Self, CoreError> {
        cfg.validate()?;

        let cfg = Arc::new(cfg);
        let registry = Arc::new(RunRegistry::new());
        let active = ActiveRuns::new();
        metrics.bind_active_gauge(active.gauge());

        let pool = WorkerPool::spawn(WorkerContext {
            cfg: Arc::clone(&cfg),
            registry: Arc::clone(&registry),
            backend,
            metrics,
            active: active.clone(),
        });

        Ok(Self {
            cfg,
            registry,
            active,
            pool,
        })
    }

    /// Admit a run and queue it for execution.
    ///
    /// Returns the record as registered (`QUEUED`). Rejected submissions leave no record.
    #[instrument(level = "debug", skip_all, fields(script = req.script.as_deref().unwrap_or("")))]
    pub async fn submit(&self, req: StartRunRequest) -> Result<RunRecord, CoreError> {
        let spec = admission::validate(req, &self.cfg).await?;
        let slot = self.pool.reserve().await?;
        let record = self.register(&spec)?;

        slot.send(Job {
            id: record.id.clone(),
            spec,
            summary_path: self.cfg.summary_path(&record.id),
        })?;
        info!(run = %record.id, script = %record.script, "run queued");
        Ok(record)
    }

    fn register(&self, spec: &JobSpec) -> Result<RunRecord, CoreError> {
        let mut last = None;
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = RunId::generate();
            let record = RunRecord::queued(
                id.clone(),
                spec.script.clone(),
                spec.params.clone(),
                self.cfg.summary_path(&id),
                OffsetDateTime::now_utc(),
            );
            match self.registry.insert(record.clone()) {
                Ok(()) => return Ok(record),
                Err(RegistryError::Duplicate(id)) => {
                    debug!(run = %id, "run id collision, drawing another");
                    last = Some(id);
                }
                Err(e) => return Err(e.into()),
            }
        }
        let id = last.unwrap_or_else(RunId::generate);
        Err(RegistryError::Duplicate(id).into())
    }

    /// All runs, most recent first.
    pub fn list(&self) -> Vec<RunRecord> {
        self.registry.list()
    }

    pub fn get(&self, id: &RunId) -> Result<RunRecord, NotFoundError> {
        self.registry
            .get(id)
            .ok_or_else(|| NotFoundError::RunNotFound(id.clone()))
    }

    /// Raw bytes of the summary artifact k6 exported for `id`.
    ///
    /// Existence is checked at read time only; a run may still be writing it.
    pub async fn summary(&self, id: &RunId) -> Result<Vec<u8>, CoreError> {
        let record = self.get(id)?;
        let path = record
            .summary_path()
            .ok_or_else(|| NotFoundError::SummaryNotAssigned(id.clone()))?
            .to_path_buf();

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(NotFoundError::SummaryNotWritten(path).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Number of runs currently executing.
    pub fn active_runs(&self) -> i64 {
        self.active.current()
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.cfg
    }

    /// Stop accepting submissions and wait for the workers to exit.
    pub async fn shutdown(&self) {
        info!(active = self.active_runs(), "run service shutting down");
        self.pool.shutdown().await;
    }
}

impl fmt::Debug for RunService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunService")
            .field("runs", &self.registry.len())
            .field("active", &self.active.current())
            .field("pool", &self.pool)
            .finish()
    }
}
