use thiserror::Error;

/// Failures reported by an [`ExecBackend`](crate::ExecBackend).
///
/// Never surfaced to submitters: a run hitting one of these ends as `FAILED`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("runtime unreachable: {0}")]
    Connect(String),

    #[error("exec create failed: {0}")]
    Create(String),

    #[error("exec start failed: {0}")]
    Start(String),

    #[error("output stream failed: {0}")]
    Stream(String),

    #[error("exec inspect failed: {0}")]
    Inspect(String),

    #[error("exec terminate failed: {0}")]
    Terminate(String),
}

impl RuntimeError {
    /// Bounded label used for the runner-error metric.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::Connect(_) => "connect_failed",
            RuntimeError::Create(_) => "create_failed",
            RuntimeError::Start(_) => "start_failed",
            RuntimeError::Stream(_) => "stream_failed",
            RuntimeError::Inspect(_) => "inspect_failed",
            RuntimeError::Terminate(_) => "terminate_failed",
        }
    }
}
