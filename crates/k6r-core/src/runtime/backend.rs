use std::{fmt, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use k6r_model::Env;

use crate::runtime::error::RuntimeError;

/// Identifier of an exec instance, as assigned by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecId(String);

impl ExecId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the runtime needs to create an exec instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    /// Name of the container the command runs in.
    pub target: String,
    /// Environment assignments, later entries shadow earlier ones.
    pub env: Env,
    /// Command line, program first.
    pub cmd: Vec<String>,
    pub attach_stdout: bool,
    pub attach_stderr: bool,
}

/// Origin of an output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Stdout,
    Stderr,
    /// Combined output of a tty-attached exec.
    Console,
}

impl OutputKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            OutputKind::Stdout => "stdout",
            OutputKind::Stderr => "stderr",
            OutputKind::Console => "console",
        }
    }
}

/// One chunk of container output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFrame {
    pub kind: OutputKind,
    pub payload: Bytes,
}

impl OutputFrame {
    pub fn stdout(payload: impl Into<Bytes>) -> Self {
        Self {
            kind: OutputKind::Stdout,
            payload: payload.into(),
        }
    }

    pub fn stderr(payload: impl Into<Bytes>) -> Self {
        Self {
            kind: OutputKind::Stderr,
            payload: payload.into(),
        }
    }
}

/// Stream of output frames. Ends on normal completion; an `Err` item is terminal.
pub type OutputStream = BoxStream<'static, Result<OutputFrame, RuntimeError>>;

/// Container runtime seam.
///
/// Implementations must be cheap to share: one instance serves every worker.
#[async_trait]
pub trait ExecBackend: Send + Sync + 'static {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Create (but do not start) an exec instance.
    async fn create(&self, request: &ExecRequest) -> Result<ExecId, RuntimeError>;

    /// Start the exec instance and attach to its output.
    async fn start(&self, exec: &ExecId) -> Result<OutputStream, RuntimeError>;

    /// Exit code of a finished exec instance; `None` when the runtime does not report one.
    async fn inspect(&self, exec: &ExecId) -> Result<Option<i64>, RuntimeError>;

    /// Stop an exec instance that is still running and return once it has exited.
    ///
    /// Called when a run is abandoned (timeout, shutdown) so its process does not outlive the
    /// worker slot. Must succeed for an instance that already finished.
    async fn terminate(&self, exec: &ExecId) -> Result<(), RuntimeError>;
}

/// Shared handle to an execution backend.
pub type ExecHandle = Arc<dyn ExecBackend>;
