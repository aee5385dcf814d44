use std::fmt;

use thiserror::Error;

use k6r_core::RuntimeError;

/// Exec lifecycle step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOp {
    Create,
    Start,
    Stream,
    Inspect,
    Terminate,
}

impl ExecOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecOp::Create => "create_exec",
            ExecOp::Start => "start_exec",
            ExecOp::Stream => "attach_output",
            ExecOp::Inspect => "inspect_exec",
            ExecOp::Terminate => "terminate_exec",
        }
    }
}

impl fmt::Display for ExecOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("cannot connect to docker at {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("docker {operation} on '{target}' failed: {message}")]
    Operation {
        operation: ExecOp,
        target: String,
        message: String,
    },

    #[error("invalid runtime configuration: {0}")]
    InvalidConfig(String),
}

impl From<ExecError> for RuntimeError {
    fn from(e: ExecError) -> Self {
        let reason = e.to_string();
        match e {
            ExecError::Connect { .. } | ExecError::InvalidConfig(_) => RuntimeError::Connect(reason),
            ExecError::Operation { operation, .. } => match operation {
                ExecOp::Create => RuntimeError::Create(reason),
                ExecOp::Start => RuntimeError::Start(reason),
                ExecOp::Stream => RuntimeError::Stream(reason),
                ExecOp::Inspect => RuntimeError::Inspect(reason),
                ExecOp::Terminate => RuntimeError::Terminate(reason),
            },
        }
    }
}
