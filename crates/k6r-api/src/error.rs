use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use k6r_core::{CoreError, NotFoundError};

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// The runner cannot take work right now (queue full, shutting down).
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Attach the request path the error refers to.
    pub fn at(self, instance: impl Into<String>) -> Problem {
        let mut problem = Problem::from(self);
        problem.instance = Some(instance.into());
        problem
    }
}

impl From<NotFoundError> for ApiError {
    fn from(e: NotFoundError) -> Self {
        ApiError::NotFound(e.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(v) => ApiError::InvalidRequest(v.to_string()),
            CoreError::NotFound(nf) => nf.into(),
            CoreError::QueueFull { .. } | CoreError::ShuttingDown => {
                ApiError::Unavailable(e.to_string())
            }
            CoreError::Registry(_) | CoreError::Config(_) | CoreError::Io(_) => {
                error!(error = %e, "internal error while serving request");
                ApiError::Internal(e.to_string())
            }
        }
    }
}

/// Problem-detail error body.
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    pub status: u16,
    pub title: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl From<ApiError> for Problem {
    fn from(e: ApiError) -> Self {
        let status = e.status();
        Self {
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            detail: e.to_string(),
            instance: None,
        }
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match serde_json::to_vec(&self) {
            Ok(body) => (status, [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)], body).into_response(),
            Err(_) => (status, self.detail).into_response(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        Problem::from(self).into_response()
    }
}
