use async_trait::async_trait;

use k6r_model::{RunId, RunRecord, RunStatus, StartRunRequest};

use crate::error::ApiError;

/// Run API handler.
///
/// Abstracts the backend so front ends can wrap it (auth, rate limiting) or fake it in tests.
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Admit a run; the returned record is `QUEUED`.
    async fn submit_run(&self, req: StartRunRequest) -> Result<RunRecord, ApiError>;

    /// All runs, most recent first.
    async fn list_runs(&self) -> Result<Vec<RunRecord>, ApiError>;

    /// Runs currently in `status`, most recent first.
    async fn list_runs_by_status(&self, status: RunStatus) -> Result<Vec<RunRecord>, ApiError> {
        let runs = self.list_runs().await?;
        Ok(runs.into_iter().filter(|r| r.status == status).collect())
    }

    async fn get_run(&self, id: &RunId) -> Result<RunRecord, ApiError>;

    /// Raw summary JSON exported by k6.
    async fn get_summary(&self, id: &RunId) -> Result<Vec<u8>, ApiError>;
}
