#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, OnceLock,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::{StreamExt, stream};
use tempfile::TempDir;

use k6r_core::{
    ActiveGauge, ExecBackend, ExecId, ExecRequest, MetricsBackend, OutputFrame, OutputStream,
    RunService, RunnerConfig, RuntimeError,
};
use k6r_model::{RunId, RunOutcome, RunRecord};

pub const ALLOWED: &str = "http://backend:8080";

/// How the fake runtime treats a script.
#[derive(Debug, Clone)]
pub enum Step {
    /// Emit one stdout line, then exit with the code.
    Exit(i64),
    /// Fail the stream mid-way, then report the code on inspect.
    StreamError(i64),
    CreateFails,
    /// Never finish the stream.
    Hang,
    Panic,
}

/// Scripted execution backend keyed by script file name.
pub struct FakeBackend {
    steps: HashMap<String, Step>,
    default: Step,
    delay: Duration,
    write_summary: bool,
    execs: Mutex<HashMap<String, ExecRequest>>,
    seq: AtomicUsize,
    live: Mutex<HashSet<String>>,
    max_running: AtomicUsize,
    terminated: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
            default: Step::Exit(0),
            delay: Duration::ZERO,
            write_summary: false,
            execs: Mutex::new(HashMap::new()),
            seq: AtomicUsize::new(0),
            live: Mutex::new(HashSet::new()),
            max_running: AtomicUsize::new(0),
            terminated: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, script: &str, step: Step) -> Self {
        self.steps.insert(script.to_string(), step);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn writing_summaries(mut self) -> Self {
        self.write_summary = true;
        self
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    /// Execs started and not yet inspected or terminated.
    pub fn running(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub fn terminated(&self) -> Vec<String> {
        self.terminated.lock().unwrap().clone()
    }

    /// Mark `exec` finished; false if it was not running.
    fn finish(&self, exec: &ExecId) -> bool {
        self.live.lock().unwrap().remove(exec.as_str())
    }

    pub fn requests(&self) -> Vec<ExecRequest> {
        self.execs.lock().unwrap().values().cloned().collect()
    }

    fn request(&self, exec: &ExecId) -> ExecRequest {
        self.execs.lock().unwrap()[exec.as_str()].clone()
    }

    fn step_for(&self, req: &ExecRequest) -> Step {
        let script = req
            .cmd
            .last()
            .and_then(|p| Path::new(p).file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.steps.get(script).cloned().unwrap_or(self.default.clone())
    }
}

#[async_trait]
impl ExecBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn create(&self, request: &ExecRequest) -> Result<ExecId, RuntimeError> {
        if matches!(self.step_for(request), Step::CreateFails) {
            return Err(RuntimeError::Create(format!(
                "no such container: {}",
                request.target
            )));
        }
        let id = format!("exec-{}", self.seq.fetch_add(1, Ordering::SeqCst));
        self.execs.lock().unwrap().insert(id.clone(), request.clone());
        Ok(ExecId::new(id))
    }

    async fn start(&self, exec: &ExecId) -> Result<OutputStream, RuntimeError> {
        let req = self.request(exec);
        let now = {
            let mut live = self.live.lock().unwrap();
            live.insert(exec.as_str().to_string());
            live.len()
        };
        self.max_running.fetch_max(now, Ordering::SeqCst);

        let delay = self.delay;
        match self.step_for(&req) {
            Step::Hang => Ok(stream::pending().boxed()),
            Step::Panic => panic!("fake runtime exploded"),
            Step::StreamError(_) => Ok(stream::iter(vec![
                Ok(OutputFrame::stdout("running (0m00.1s)\n")),
                Err(RuntimeError::Stream("connection reset by peer".into())),
            ])
            .boxed()),
            _ => Ok(stream::once(async move {
                tokio::time::sleep(delay).await;
                Ok(OutputFrame::stdout("checks.....: 100.00% ✓ 1 ✗ 0\n"))
            })
            .boxed()),
        }
    }

    async fn inspect(&self, exec: &ExecId) -> Result<Option<i64>, RuntimeError> {
        let req = self.request(exec);
        self.finish(exec);

        if self.write_summary {
            let summary = summary_arg(&req);
            fs::write(summary, br#"{"metrics":{}}"#)
                .map_err(|e| RuntimeError::Inspect(e.to_string()))?;
        }
        match self.step_for(&req) {
            Step::Exit(code) | Step::StreamError(code) => Ok(Some(code)),
            _ => Ok(None),
        }
    }

    async fn terminate(&self, exec: &ExecId) -> Result<(), RuntimeError> {
        if self.finish(exec) {
            self.terminated.lock().unwrap().push(exec.to_string());
        }
        Ok(())
    }
}

/// Value following `--summary-export` in the command line.
pub fn summary_arg(req: &ExecRequest) -> PathBuf {
    let pos = req
        .cmd
        .iter()
        .position(|a| a == "--summary-export")
        .expect("summary flag");
    PathBuf::from(&req.cmd[pos + 1])
}

/// Metrics backend recording every call.
#[derive(Default)]
pub struct RecordingMetrics {
    pub started: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
    pub errors: Mutex<Vec<String>>,
    gauge: OnceLock<ActiveGauge>,
}

impl RecordingMetrics {
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn active(&self) -> i64 {
        self.gauge.get().map(|g| g()).unwrap_or(0)
    }
}

impl MetricsBackend for RecordingMetrics {
    fn record_run_started(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn record_run_completed(&self, outcome: RunOutcome, _: u64) {
        match outcome {
            RunOutcome::Succeeded => self.succeeded.fetch_add(1, Ordering::SeqCst),
            RunOutcome::Failed => self.failed.fetch_add(1, Ordering::SeqCst),
        };
    }

    fn record_runner_error(&self, error_kind: &str) {
        self.errors.lock().unwrap().push(error_kind.to_string());
    }

    fn bind_active_gauge(&self, gauge: ActiveGauge) {
        let _ = self.gauge.set(gauge);
    }
}

/// Scripts and results directories laid out like the runner container.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new(scripts: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        for s in scripts {
            let path = dir.path().join("scripts").join(s);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "export default function () {}").unwrap();
        }
        fs::create_dir_all(dir.path().join("results")).unwrap();
        Self { dir }
    }

    pub fn config(&self) -> RunnerConfig {
        RunnerConfig {
            scripts_dir: self.dir.path().join("scripts"),
            results_dir: self.dir.path().join("results"),
            allow_base_url: ALLOWED.to_string(),
            ..Default::default()
        }
    }
}

pub struct Harness {
    pub service: RunService,
    pub backend: Arc<FakeBackend>,
    pub metrics: Arc<RecordingMetrics>,
    pub ws: Workspace,
}

impl Harness {
    pub fn start(ws: Workspace, cfg: RunnerConfig, backend: FakeBackend) -> Self {
        let backend = Arc::new(backend);
        let metrics = Arc::new(RecordingMetrics::default());
        let service = RunService::new(cfg, backend.clone(), metrics.clone()).unwrap();
        Self {
            service,
            backend,
            metrics,
            ws,
        }
    }
}

/// Poll until `id` is terminal.
pub async fn wait_terminal(service: &RunService, id: &RunId) -> RunRecord {
    wait_for(service, id, |r| r.is_terminal()).await
}

pub async fn wait_for(
    service: &RunService,
    id: &RunId,
    pred: impl Fn(&RunRecord) -> bool,
) -> RunRecord {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let rec = service.get(id).unwrap();
            if pred(&rec) {
                return rec;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("run did not reach the expected state in time")
}
