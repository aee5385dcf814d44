use thiserror::Error;

/// Client-caused rejection of a submission.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("script is required")]
    MissingScript,

    #[error("invalid script name: {0}")]
    InvalidScriptName(String),

    #[error("script not found: {0}")]
    ScriptNotFound(String),

    #[error("BASE_URL must be {allowed}")]
    BaseUrlNotAllowed { allowed: String },
}
