use std::sync::Arc;

use async_trait::async_trait;

use k6r_core::RunService;
use k6r_model::{RunId, RunRecord, StartRunRequest};

use crate::{error::ApiError, handler::ApiHandler};

/// [`ApiHandler`] delegating to a [`RunService`].
pub struct RunServiceAdapter {
    service: Arc<RunService>,
}

impl RunServiceAdapter {
    pub fn new(service: Arc<RunService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ApiHandler for RunServiceAdapter {
    async fn submit_run(&self, req: StartRunRequest) -> Result<RunRecord, ApiError> {
        self.service.submit(req).await.map_err(ApiError::from)
    }

    async fn list_runs(&self) -> Result<Vec<RunRecord>, ApiError> {
        Ok(self.service.list())
    }

    async fn get_run(&self, id: &RunId) -> Result<RunRecord, ApiError> {
        self.service.get(id).map_err(ApiError::from)
    }

    async fn get_summary(&self, id: &RunId) -> Result<Vec<u8>, ApiError> {
        self.service.summary(id).await.map_err(ApiError::from)
    }
}
