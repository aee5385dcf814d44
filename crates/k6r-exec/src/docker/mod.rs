//! Docker execution backend.
//!
//! Runs each k6 invocation as an exec instance inside an already running container
//! (the `k6Container` of the runner configuration), attached to stdout and stderr.
mod backend;
pub use backend::DockerExecBackend;

mod frame;
pub use frame::output_frame;

mod signal;
pub use signal::{StopSignal, command_line_pattern, pkill_command};
