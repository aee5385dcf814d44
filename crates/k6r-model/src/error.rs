use thiserror::Error;

use crate::RunStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("illegal run status transition: {from} -> {to}")]
    IllegalTransition { from: RunStatus, to: RunStatus },

    #[error("unknown run status: {0}")]
    UnknownStatus(String),

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
