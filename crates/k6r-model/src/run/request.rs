use serde::{Deserialize, Serialize};

use crate::Params;

/// Submission body for a new run.
///
/// Both fields are optional on the wire; admission rejects a missing `script`
/// and treats missing `params` as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRunRequest {
    /// Script path relative to the scripts directory, e.g. `constant_rate.js`.
    #[serde(default)]
    pub script: Option<String>,
    /// Script parameters such as `RPS` or `DURATION`.
    #[serde(default)]
    pub params: Option<Params>,
}

impl StartRunRequest {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: Some(script.into()),
            params: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key, value);
        self
    }
}
