use std::path::PathBuf;

use thiserror::Error;

use k6r_model::RunId;

use crate::{admission::ValidationError, registry::RegistryError};

/// Lookup failures, each with a distinct cause.
#[derive(Debug, Error)]
pub enum NotFoundError {
    #[error("run not found: {0}")]
    RunNotFound(RunId),

    #[error("summary not assigned for run: {0}")]
    SummaryNotAssigned(RunId),

    #[error("summary not written yet: {}", .0.display())]
    SummaryNotWritten(PathBuf),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("submission queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("runner is shutting down")]
    ShuttingDown,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
