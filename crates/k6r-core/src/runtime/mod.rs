//! Execution adapter boundary and the per-run execution protocol.
//!
//! [`ExecBackend`] is the narrow interface to the container runtime (create, start, inspect, terminate).
//! [`execute`] drives one run through it: the output stream is pumped on its own task, the
//! worker waits for the one-shot [`Completion`] signal, then asks the runtime for the exit code.
//! Abandoned runs are terminated before the worker moves on.
mod backend;
pub use backend::{ExecBackend, ExecHandle, ExecId, ExecRequest, OutputFrame, OutputKind, OutputStream};

mod error;
pub use error::RuntimeError;

mod command;
pub use command::{K6_BINARY, build_request};

mod output;
pub use output::{OUTPUT_LOG_TARGET, truncate_line};

mod protocol;
pub use protocol::{Completion, Execution, ExecutionError, execute};
