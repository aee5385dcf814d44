use std::time::Duration;

use async_trait::async_trait;
use bollard::{
    API_DEFAULT_VERSION, Docker,
    errors::Error as BollardError,
    exec::{CreateExecOptions, StartExecOptions, StartExecResults},
    models::ExecInspectResponse,
};
use futures::{StreamExt, future, stream};
use tracing::{debug, trace, warn};

use k6r_core::{ExecBackend, ExecId, ExecRequest, OutputStream, RuntimeError};

use crate::{
    DockerConfig, DockerEndpoint, ExecError, ExecOp, RUNTIME_DOCKER,
    docker::{
        frame::output_frame,
        signal::{StopSignal, command_line_pattern, pkill_command},
    },
};

/// Inspections allowed while the daemon still reports the exec as running after its output closed.
const INSPECT_ATTEMPTS: usize = 20;
const INSPECT_BACKOFF: Duration = Duration::from_millis(50);

/// Checks after each stop signal before escalating; k6 gets about ten seconds to wind down.
const STOP_ATTEMPTS: usize = 40;
const STOP_BACKOFF: Duration = Duration::from_millis(250);

/// [`ExecBackend`] talking to a docker daemon through `bollard`.
#[derive(Debug, Clone)]
pub struct DockerExecBackend {
    docker: Docker,
    endpoint: DockerEndpoint,
}

impl DockerExecBackend {
    /// Build a client for `cfg.endpoint`.
    ///
    /// The daemon is not contacted here; use [`DockerExecBackend::ping`] to check reachability.
    pub fn connect(cfg: &DockerConfig) -> Result<Self, ExecError> {
        cfg.validate()?;
        let docker = match &cfg.endpoint {
            DockerEndpoint::Local => Docker::connect_with_local_defaults(),
            DockerEndpoint::UnixSocket(path) => Docker::connect_with_socket(
                &path.to_string_lossy(),
                cfg.timeout_secs,
                API_DEFAULT_VERSION,
            ),
            DockerEndpoint::Http(addr) => {
                Docker::connect_with_http(addr, cfg.timeout_secs, API_DEFAULT_VERSION)
            }
        }
        .map_err(|e| ExecError::Connect {
            endpoint: cfg.endpoint.label(),
            message: e.to_string(),
        })?;

        debug!(endpoint = %cfg.endpoint, "docker client configured");
        Ok(Self {
            docker,
            endpoint: cfg.endpoint.clone(),
        })
    }

    /// Round-trip to the daemon.
    pub async fn ping(&self) -> Result<(), ExecError> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| ExecError::Connect {
                endpoint: self.endpoint.label(),
                message: e.to_string(),
            })
    }

    async fn inspect_exec(
        &self,
        exec: &ExecId,
        op: ExecOp,
    ) -> Result<ExecInspectResponse, RuntimeError> {
        self.docker
            .inspect_exec(exec.as_str())
            .await
            .map_err(|e| op_error(op, exec.as_str(), e))
    }

    /// Deliver `signal` through a detached `pkill` exec in `container`.
    async fn send_signal(
        &self,
        container: &str,
        signal: StopSignal,
        pattern: &str,
    ) -> Result<(), RuntimeError> {
        let options = CreateExecOptions {
            attach_stdout: Some(false),
            attach_stderr: Some(false),
            cmd: Some(pkill_command(signal, pattern)),
            ..Default::default()
        };
        let killer = self
            .docker
            .create_exec(container, options)
            .await
            .map_err(|e| op_error(ExecOp::Terminate, container, e))?;
        self.docker
            .start_exec(
                &killer.id,
                Some(StartExecOptions {
                    detach: true,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| op_error(ExecOp::Terminate, container, e))?;
        Ok(())
    }

    /// Poll until `exec` is no longer running; `false` if it still is after `attempts` checks.
    async fn wait_stopped(&self, exec: &ExecId, attempts: usize) -> Result<bool, RuntimeError> {
        for _ in 0..attempts {
            tokio::time::sleep(STOP_BACKOFF).await;
            if self.inspect_exec(exec, ExecOp::Terminate).await?.running != Some(true) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn op_error(operation: ExecOp, target: &str, source: BollardError) -> RuntimeError {
    ExecError::Operation {
        operation,
        target: target.to_string(),
        message: source.to_string(),
    }
    .into()
}

#[async_trait]
impl ExecBackend for DockerExecBackend {
    fn name(&self) -> &'static str {
        RUNTIME_DOCKER
    }

    async fn create(&self, request: &ExecRequest) -> Result<ExecId, RuntimeError> {
        let options = CreateExecOptions {
            attach_stdout: Some(request.attach_stdout),
            attach_stderr: Some(request.attach_stderr),
            env: Some(request.env.to_assignments()),
            cmd: Some(request.cmd.clone()),
            ..Default::default()
        };
        let created = self
            .docker
            .create_exec(&request.target, options)
            .await
            .map_err(|e| op_error(ExecOp::Create, &request.target, e))?;

        trace!(container = %request.target, exec = %created.id, "docker exec created");
        Ok(ExecId::new(created.id))
    }

    async fn start(&self, exec: &ExecId) -> Result<OutputStream, RuntimeError> {
        let started = self
            .docker
            .start_exec(exec.as_str(), None::<StartExecOptions>)
            .await
            .map_err(|e| op_error(ExecOp::Start, exec.as_str(), e))?;

        match started {
            StartExecResults::Attached { output, .. } => {
                let target = exec.to_string();
                Ok(output
                    .filter_map(move |item| {
                        future::ready(match item {
                            Ok(out) => output_frame(out).map(Ok),
                            Err(e) => Some(Err(op_error(ExecOp::Stream, &target, e))),
                        })
                    })
                    .boxed())
            }
            StartExecResults::Detached => Ok(stream::empty().boxed()),
        }
    }

    async fn inspect(&self, exec: &ExecId) -> Result<Option<i64>, RuntimeError> {
        for _ in 0..INSPECT_ATTEMPTS {
            let info = self.inspect_exec(exec, ExecOp::Inspect).await?;

            if info.running != Some(true) {
                return Ok(info.exit_code);
            }
            tokio::time::sleep(INSPECT_BACKOFF).await;
        }
        debug!(exec = %exec, "exec still running after output closed");
        Ok(None)
    }

    async fn terminate(&self, exec: &ExecId) -> Result<(), RuntimeError> {
        let info = self.inspect_exec(exec, ExecOp::Terminate).await?;
        if info.running != Some(true) {
            return Ok(());
        }
        let terminate_error = |message: &str| -> RuntimeError {
            ExecError::Operation {
                operation: ExecOp::Terminate,
                target: exec.to_string(),
                message: message.to_string(),
            }
            .into()
        };
        let container = info
            .container_id
            .ok_or_else(|| terminate_error("daemon did not report the exec's container"))?;
        let argv: Vec<String> = info
            .process_config
            .map(|pc| pc.entrypoint.into_iter().chain(pc.arguments.unwrap_or_default()).collect())
            .unwrap_or_default();
        if argv.is_empty() {
            return Err(terminate_error("daemon did not report the exec's command line"));
        }
        let pattern = command_line_pattern(&argv);

        for signal in [StopSignal::Term, StopSignal::Kill] {
            self.send_signal(&container, signal, &pattern).await?;
            if self.wait_stopped(exec, STOP_ATTEMPTS).await? {
                debug!(exec = %exec, signal = signal.as_flag(), "exec stopped");
                return Ok(());
            }
            warn!(exec = %exec, signal = signal.as_flag(), "exec ignored stop signal");
        }
        Err(terminate_error("exec still running after SIGKILL"))
    }
}
