use std::{sync::Arc, time::Instant};

use time::OffsetDateTime;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::{sync::CancellationToken, task::AbortOnDropHandle};
use tracing::{debug, error, info, trace, warn};

use k6r_model::{RunId, RunOutcome, RunStatus};

use crate::{
    metrics::ActiveGuard,
    registry::RegistryError,
    runtime::{self, ExecutionError},
    scheduler::{Job, WorkerContext, queue::JobReceiver},
};

pub(super) async fn worker_loop(
    idx: usize,
    ctx: Arc<WorkerContext>,
    queue: Arc<AsyncMutex<JobReceiver>>,
    cancel: CancellationToken,
) {
    trace!(worker = idx, "worker started");
    loop {
        let job = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                job = rx.recv() => job,
            }
        };
        let Some(job) = job else {
            break;
        };
        run_one(&ctx, job, &cancel).await;
    }
    trace!(worker = idx, "worker stopped");
}

/// Execute one job and always leave its record in a terminal state.
async fn run_one(ctx: &WorkerContext, job: Job, cancel: &CancellationToken) {
    let guard = match RunGuard::begin(ctx, &job.id) {
        Ok(guard) => guard,
        Err(e) => {
            error!(run = %job.id, error = %e, "cannot start run");
            return;
        }
    };

    let request = runtime::build_request(&ctx.cfg, &job.spec, &job.summary_path);
    let backend = Arc::clone(&ctx.backend);
    let run_id = job.id.clone();
    let output = ctx.cfg.output;
    let timeout = ctx.cfg.run_timeout();

    // Separate task so a panicking backend cannot take the worker down with it.
    // `execute` observes `cancel` and terminates the exec before returning.
    let cancel = cancel.clone();
    let task = AbortOnDropHandle::new(tokio::spawn(async move {
        runtime::execute(&backend, &run_id, request, output, timeout, &cancel).await
    }));

    let result = match task.await {
        Ok(res) => res,
        Err(e) if e.is_panic() => Err(ExecutionError::Panicked(e.to_string())),
        Err(_) => Err(ExecutionError::Interrupted),
    };

    let outcome = match result {
        Ok(execution) => {
            debug!(
                run = %job.id,
                exit_code = ?execution.exit_code,
                completion = ?execution.completion,
                "execution finished"
            );
            execution.outcome()
        }
        Err(e) => {
            warn!(run = %job.id, kind = e.kind(), error = %e, "execution failed");
            ctx.metrics.record_runner_error(e.kind());
            RunOutcome::Failed
        }
    };
    guard.finish(outcome);
}

/// Bookkeeping for a run between `RUNNING` and its terminal state.
///
/// Dropping it without [`RunGuard::finish`] finalizes the run as `FAILED`.
struct RunGuard<'a> {
    ctx: &'a WorkerContext,
    id: RunId,
    started: Instant,
    active: Option<ActiveGuard>,
}

impl<'a> RunGuard<'a> {
    fn begin(ctx: &'a WorkerContext, id: &RunId) -> Result<Self, RegistryError> {
        ctx.registry
            .transition(id, RunStatus::Running, OffsetDateTime::now_utc())?;
        ctx.metrics.record_run_started();
        let active = ctx.active.enter();
        info!(run = %id, "run started");

        Ok(Self {
            ctx,
            id: id.clone(),
            started: Instant::now(),
            active: Some(active),
        })
    }

    fn finish(mut self, outcome: RunOutcome) {
        self.finalize(outcome);
    }

    /// Counters and the active count settle before the terminal status becomes visible.
    fn finalize(&mut self, outcome: RunOutcome) {
        let Some(active) = self.active.take() else {
            return;
        };
        let duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.ctx.metrics.record_run_completed(outcome, duration_ms);
        drop(active);

        match self
            .ctx
            .registry
            .transition(&self.id, outcome.status(), OffsetDateTime::now_utc())
        {
            Ok(record) => info!(
                run = %self.id,
                status = %record.status,
                duration_ms,
                "run finished"
            ),
            Err(e) => error!(run = %self.id, error = %e, "cannot finalize run"),
        }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.finalize(RunOutcome::Failed);
    }
}
