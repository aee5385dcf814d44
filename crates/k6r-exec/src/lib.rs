//! Container runtime backends for the k6 run orchestrator.
//!
//! The Docker backend lives behind the `docker` feature; [`DockerConfig`] and [`DockerEndpoint`]
//! are always available so front ends can parse configuration without pulling in the client.
mod error;
pub use error::{ExecError, ExecOp};

mod config;
pub use config::{DEFAULT_DOCKER_TIMEOUT_SECS, DockerConfig, DockerEndpoint};

/// Docker runtime identifier used in logs.
pub const RUNTIME_DOCKER: &str = "docker";

#[cfg(feature = "docker")]
pub mod docker;
