use std::path::Path;

use k6r_model::{ENV_COMPATIBILITY_MODE, ENV_PROM_RW_SERVER_URL, Env};

use crate::{admission::JobSpec, config::RunnerConfig, runtime::backend::ExecRequest};

/// Program invoked inside the target container.
pub const K6_BINARY: &str = "k6";

const COMPATIBILITY_MODE: &str = "extended";

/// Build the exec request for one admitted job.
///
/// Environment order is fixed: remote-write URL, compatibility mode, then the job params.
pub fn build_request(cfg: &RunnerConfig, job: &JobSpec, summary_path: &Path) -> ExecRequest {
    let mut env = Env::new();
    env.push(ENV_PROM_RW_SERVER_URL, cfg.prom_remote_write_url.as_str());
    env.push(ENV_COMPATIBILITY_MODE, COMPATIBILITY_MODE);
    env.extend_params(&job.params);

    let cmd = vec![
        K6_BINARY.to_string(),
        "run".to_string(),
        format!("--compatibility-mode={COMPATIBILITY_MODE}"),
        "-o".to_string(),
        "experimental-prometheus-rw".to_string(),
        "--summary-export".to_string(),
        summary_path.display().to_string(),
        job.script_path.display().to_string(),
    ];

    ExecRequest {
        target: cfg.k6_container.clone(),
        env,
        cmd,
        attach_stdout: true,
        attach_stderr: true,
    }
}
