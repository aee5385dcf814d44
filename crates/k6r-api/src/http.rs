use std::{str::FromStr, sync::Arc};

use axum::{
    Json, Router,
    extract::{OriginalUri, Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::debug;

use k6r_model::{RunId, RunStatus, StartRunRequest};

use crate::{
    error::{ApiError, Problem},
    handler::ApiHandler,
};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build the router.
    ///
    /// Routes:
    /// - POST /runs - Submit a run (202 + record)
    /// - GET /runs - List runs, optionally `?status=running`
    /// - GET /runs/{id} - Get one run
    /// - GET /runs/{id}/summary - Raw k6 summary JSON
    pub fn router(self) -> Router {
        Router::new()
            .route("/runs", get(list_runs::<H>).post(submit_run::<H>))
            .route("/runs/{id}", get(get_run::<H>))
            .route("/runs/{id}/summary", get(get_summary::<H>))
            .with_state(self.handler)
    }
}

#[derive(Debug, Deserialize)]
struct ListRunsQuery {
    status: Option<String>,
}

/// POST /runs
async fn submit_run<H>(
    State(handler): State<Arc<H>>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<StartRunRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Problem>
where
    H: ApiHandler,
{
    let Json(req) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()).at(uri.path()))?;
    let record = handler
        .submit_run(req)
        .await
        .map_err(|e| e.at(uri.path()))?;

    debug!(run = %record.id, "run accepted");
    Ok((StatusCode::ACCEPTED, Json(record)))
}

/// GET /runs
async fn list_runs<H>(
    State(handler): State<Arc<H>>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ListRunsQuery>,
) -> Result<impl IntoResponse, Problem>
where
    H: ApiHandler,
{
    let runs = match query.status {
        Some(raw) => {
            let status = RunStatus::from_str(&raw).map_err(|_| {
                ApiError::InvalidRequest(format!(
                    "invalid status: '{raw}' (valid: queued, running, succeeded, failed)"
                ))
                .at(uri.path())
            })?;
            handler.list_runs_by_status(status).await
        }
        None => handler.list_runs().await,
    }
    .map_err(|e| e.at(uri.path()))?;

    Ok(Json(runs))
}

/// GET /runs/{id}
async fn get_run<H>(
    State(handler): State<Arc<H>>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Problem>
where
    H: ApiHandler,
{
    let record = handler
        .get_run(&RunId::from(id))
        .await
        .map_err(|e| e.at(uri.path()))?;
    Ok(Json(record))
}

/// GET /runs/{id}/summary
async fn get_summary<H>(
    State(handler): State<Arc<H>>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Problem>
where
    H: ApiHandler,
{
    let bytes = handler
        .get_summary(&RunId::from(id))
        .await
        .map_err(|e| e.at(uri.path()))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, path::PathBuf, sync::Mutex};

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::Request,
    };
    use time::OffsetDateTime;
    use tower::ServiceExt;

    use k6r_model::{Params, RunRecord};

    /// In-memory handler: only `ok.js` is admitted.
    #[derive(Default)]
    struct Fake {
        runs: Mutex<HashMap<RunId, RunRecord>>,
        summaries: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl ApiHandler for Fake {
        async fn submit_run(&self, req: StartRunRequest) -> Result<RunRecord, ApiError> {
            let script = req.script.unwrap_or_default();
            if script != "ok.js" {
                return Err(ApiError::InvalidRequest(format!("script not found: {script}")));
            }
            let id = RunId::from(format!("run{}", self.runs.lock().unwrap().len()));
            let record = RunRecord::queued(
                id.clone(),
                script,
                req.params.unwrap_or_else(Params::new),
                PathBuf::from(format!("/data/runs/{id}.json")),
                OffsetDateTime::UNIX_EPOCH,
            );
            self.runs.lock().unwrap().insert(id, record.clone());
            Ok(record)
        }

        async fn list_runs(&self) -> Result<Vec<RunRecord>, ApiError> {
            Ok(self.runs.lock().unwrap().values().cloned().collect())
        }

        async fn get_run(&self, id: &RunId) -> Result<RunRecord, ApiError> {
            self.runs
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(format!("run not found: {id}")))
        }

        async fn get_summary(&self, id: &RunId) -> Result<Vec<u8>, ApiError> {
            self.get_run(id).await?;
            self.summaries
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| ApiError::NotFound("summary not written yet".into()))
        }
    }

    fn app(fake: Fake) -> Router {
        HttpApi::new(Arc::new(fake)).router()
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, String, Vec<u8>) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let ctype = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec();
        (status, ctype, body)
    }

    fn post_run(body: &str) -> Request<Body> {
        Request::post("/runs")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn submit_returns_accepted_record() {
        let (status, _, body) = call(
            app(Fake::default()),
            post_run(r#"{"script":"ok.js","params":{"RPS":"10"}}"#),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "QUEUED");
        assert_eq!(json["script"], "ok.js");
        assert_eq!(json["params"]["RPS"], "10");
        assert!(json["end"].is_null());
    }

    #[tokio::test]
    async fn rejected_submission_is_problem_400() {
        let (status, ctype, body) =
            call(app(Fake::default()), post_run(r#"{"script":"missing.js"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(ctype, "application/problem+json");
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 400);
        assert_eq!(json["detail"], "script not found: missing.js");
        assert_eq!(json["instance"], "/runs");
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let (status, ctype, _) = call(app(Fake::default()), post_run("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(ctype, "application/problem+json");
    }

    #[tokio::test]
    async fn unknown_run_is_404() {
        let req = Request::get("/runs/nonexistent-id").body(Body::empty()).unwrap();
        let (status, _, body) = call(app(Fake::default()), req).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["instance"], "/runs/nonexistent-id");
    }

    #[tokio::test]
    async fn summary_is_served_as_json_bytes() {
        let mut fake = Fake::default();
        fake.submit_run(StartRunRequest::new("ok.js")).await.unwrap();
        fake.summaries
            .insert("run0".into(), br#"{"metrics":{"http_reqs":{}}}"#.to_vec());

        let req = Request::get("/runs/run0/summary").body(Body::empty()).unwrap();
        let (status, ctype, body) = call(app(fake), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ctype, "application/json");
        assert_eq!(body, br#"{"metrics":{"http_reqs":{}}}"#);
    }

    #[tokio::test]
    async fn missing_summary_is_404() {
        let fake = Fake::default();
        fake.submit_run(StartRunRequest::new("ok.js")).await.unwrap();

        let req = Request::get("/runs/run0/summary").body(Body::empty()).unwrap();
        let (status, _, body) = call(app(fake), req).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"], "summary not written yet");
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let fake = Fake::default();
        fake.submit_run(StartRunRequest::new("ok.js")).await.unwrap();

        let req = Request::get("/runs?status=queued").body(Body::empty()).unwrap();
        let (status, _, body) = call(app(fake), req).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);

        let req = Request::get("/runs?status=paused").body(Body::empty()).unwrap();
        let (status, _, _) = call(app(Fake::default()), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
