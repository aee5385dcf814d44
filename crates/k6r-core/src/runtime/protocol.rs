use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::{sync::CancellationToken, task::AbortOnDropHandle};
use tracing::{debug, trace, warn};

use k6r_model::{RunId, RunOutcome};

use crate::{
    config::OutputConfig,
    runtime::{
        backend::{ExecHandle, ExecId, ExecRequest, OutputFrame, OutputStream},
        error::RuntimeError,
        output::forward_output,
    },
};

/// One-shot signal fired by the output pump when the stream is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The stream ended normally.
    Ended,
    /// The stream failed; the exit code still decides the outcome.
    Errored(String),
}

/// Result of a run that got as far as inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub exit_code: Option<i64>,
    pub completion: Completion,
}

impl Execution {
    #[inline]
    pub fn outcome(&self) -> RunOutcome {
        RunOutcome::from_exit_code(self.exit_code)
    }
}

/// Reasons a run ends without an exit code.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("run exceeded timeout of {0:?}")]
    TimedOut(Duration),

    #[error("run interrupted by shutdown")]
    Interrupted,

    #[error("run task panicked: {0}")]
    Panicked(String),
}

impl ExecutionError {
    /// Bounded label used for the runner-error metric.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::Runtime(e) => e.kind(),
            ExecutionError::TimedOut(_) => "timeout",
            ExecutionError::Interrupted => "interrupted",
            ExecutionError::Panicked(_) => "panicked",
        }
    }
}

/// Run one exec instance to completion: create, start, wait for the stream to end, inspect.
///
/// Output is pumped on a separate task into a bounded channel drained by the log forwarder.
/// The wait is bounded by `timeout` when set and interrupted by `cancel`. Either way the exec is
/// terminated through the backend before returning [`ExecutionError::TimedOut`] or
/// [`ExecutionError::Interrupted`], so an abandoned run never keeps executing.
pub async fn execute(
    backend: &ExecHandle,
    run_id: &RunId,
    request: ExecRequest,
    output: OutputConfig,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<Execution, ExecutionError> {
    trace!(
        run = %run_id,
        backend = backend.name(),
        target = %request.target,
        cmd = ?request.cmd,
        env_len = request.env.len(),
        "creating exec"
    );
    let exec_id = backend.create(&request).await?;
    debug!(run = %run_id, exec = %exec_id, "exec created");

    let stream = backend.start(&exec_id).await?;

    let (frames_tx, frames_rx) = mpsc::channel(output.buffer_frames.max(1));
    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(forward_output(run_id.clone(), frames_rx, output));
    let pump = AbortOnDropHandle::new(tokio::spawn(pump_output(
        run_id.clone(),
        stream,
        frames_tx,
        done_tx,
    )));

    let waited = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ExecutionError::Interrupted),
        res = wait_completion(done_rx, timeout) => res,
    };
    let completion = match waited {
        Ok(completion) => completion,
        Err(e) => {
            drop(pump);
            stop(backend, run_id, &exec_id).await;
            return Err(e);
        }
    };
    if let Completion::Errored(reason) = &completion {
        warn!(run = %run_id, exec = %exec_id, reason = %reason, "output stream failed");
    }

    let exit_code = backend.inspect(&exec_id).await?;
    debug!(run = %run_id, exec = %exec_id, exit_code = ?exit_code, "exec inspected");

    Ok(Execution {
        exit_code,
        completion,
    })
}

async fn wait_completion(
    done: oneshot::Receiver<Completion>,
    timeout: Option<Duration>,
) -> Result<Completion, ExecutionError> {
    let signal = match timeout {
        Some(limit) => tokio::time::timeout(limit, done)
            .await
            .map_err(|_| ExecutionError::TimedOut(limit))?,
        None => done.await,
    };
    Ok(signal.unwrap_or_else(|_| Completion::Errored("output pump vanished".into())))
}

/// Terminate an abandoned exec; failures are logged, the run is failed regardless.
async fn stop(backend: &ExecHandle, run_id: &RunId, exec_id: &ExecId) {
    match backend.terminate(exec_id).await {
        Ok(()) => debug!(run = %run_id, exec = %exec_id, "exec terminated"),
        Err(e) => warn!(
            run = %run_id,
            exec = %exec_id,
            kind = e.kind(),
            error = %e,
            "cannot terminate exec; it may still be running"
        ),
    }
}

/// Forward frames without ever blocking on the log side, then fire the completion signal.
async fn pump_output(
    run_id: RunId,
    mut stream: OutputStream,
    frames: mpsc::Sender<OutputFrame>,
    done: oneshot::Sender<Completion>,
) {
    let mut dropped: u64 = 0;
    let completion = loop {
        match stream.next().await {
            Some(Ok(frame)) => {
                if frames.try_send(frame).is_err() {
                    dropped += 1;
                }
            }
            Some(Err(e)) => break Completion::Errored(e.to_string()),
            None => break Completion::Ended,
        }
    };
    if dropped > 0 {
        warn!(run = %run_id, dropped, "output frames dropped; log forwarder lagging");
    }
    let _ = done.send(completion);
}
