//! Admission control for run submissions.
//!
//! [`validate`] turns a raw [`StartRunRequest`] into a [`JobSpec`] or rejects it.
//! It never touches the registry; rejected submissions leave no trace.
mod error;
pub use error::ValidationError;

mod script;
pub use script::{is_safe_script_name, resolve_script_path};

use std::path::{Path, PathBuf};

use tracing::trace;

use k6r_model::{PARAM_BASE_URL, Params, StartRunRequest};

use crate::config::RunnerConfig;

/// Sanitized job produced by admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Script name as submitted (relative to the scripts directory).
    pub script: String,
    /// Normalized absolute location of the script.
    pub script_path: PathBuf,
    /// Parameters with `BASE_URL` resolved against the allow-list.
    pub params: Params,
}

/// Validate a submission against the runner configuration.
///
/// Rules, in order:
/// - `script` is present;
/// - `script` is a safe name (see [`is_safe_script_name`]);
/// - the script exists under `scripts_dir` (best-effort: it may still vanish before execution);
/// - `params["BASE_URL"]`, or the allow-listed URL when absent, equals the allow-listed URL.
pub async fn validate(req: StartRunRequest, cfg: &RunnerConfig) -> Result<JobSpec, ValidationError> {
    let script = req.script.ok_or(ValidationError::MissingScript)?;

    if !is_safe_script_name(&script) {
        return Err(ValidationError::InvalidScriptName(script));
    }

    let script_path = resolve_script_path(&cfg.scripts_dir, &script);
    if !is_regular_file(&script_path).await {
        return Err(ValidationError::ScriptNotFound(script));
    }

    let mut params = req.params.unwrap_or_default();
    let base_url = params
        .base_url()
        .unwrap_or(cfg.allow_base_url.as_str())
        .to_string();
    if base_url != cfg.allow_base_url {
        return Err(ValidationError::BaseUrlNotAllowed {
            allowed: cfg.allow_base_url.clone(),
        });
    }
    params.insert(PARAM_BASE_URL, base_url);

    trace!(script = %script, path = %script_path.display(), "submission admitted");
    Ok(JobSpec {
        script,
        script_path,
        params,
    })
}

async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ALLOWED: &str = "http://backend:8080";

    fn setup(scripts: &[&str]) -> (TempDir, RunnerConfig) {
        let dir = tempfile::tempdir().unwrap();
        for s in scripts {
            let path = dir.path().join(s);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "export default function () {}").unwrap();
        }
        let cfg = RunnerConfig {
            scripts_dir: dir.path().to_path_buf(),
            allow_base_url: ALLOWED.to_string(),
            ..Default::default()
        };
        (dir, cfg)
    }

    #[tokio::test]
    async fn missing_script_is_rejected() {
        let (_dir, cfg) = setup(&[]);
        let err = validate(StartRunRequest::default(), &cfg).await.unwrap_err();
        assert_eq!(err, ValidationError::MissingScript);
        assert_eq!(err.to_string(), "script is required");
    }

    #[tokio::test]
    async fn unknown_script_is_rejected() {
        let (_dir, cfg) = setup(&[]);
        let err = validate(StartRunRequest::new("missing.js"), &cfg).await.unwrap_err();
        assert!(err.to_string().contains("script not found"), "{err}");
    }

    #[tokio::test]
    async fn directory_named_like_script_is_not_a_script() {
        let (dir, cfg) = setup(&[]);
        fs::create_dir(dir.path().join("dir.js")).unwrap();
        let err = validate(StartRunRequest::new("dir.js"), &cfg).await.unwrap_err();
        assert!(matches!(err, ValidationError::ScriptNotFound(_)));
    }

    #[tokio::test]
    async fn traversal_is_rejected_before_touching_disk() {
        let (_dir, cfg) = setup(&["ok.js"]);
        for bad in ["../ok.js", "k6/../ok.js", "a..b.js"] {
            let err = validate(StartRunRequest::new(bad), &cfg).await.unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidScriptName(_)),
                "{bad}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn base_url_defaults_to_allowed_value() {
        let (dir, cfg) = setup(&["ok.js"]);
        let job = validate(StartRunRequest::new("ok.js"), &cfg).await.unwrap();

        assert_eq!(job.params.base_url(), Some(ALLOWED));
        assert_eq!(job.script, "ok.js");
        assert_eq!(job.script_path, dir.path().join("ok.js"));
    }

    #[tokio::test]
    async fn explicit_allowed_base_url_is_kept_with_other_params() {
        let (_dir, cfg) = setup(&["k6/mix.js"]);
        let req = StartRunRequest::new("k6/mix.js")
            .with_param("BASE_URL", ALLOWED)
            .with_param("RPS", "25");

        let job = validate(req, &cfg).await.unwrap();
        assert_eq!(job.params.get("RPS"), Some("25"));
        assert_eq!(job.params.base_url(), Some(ALLOWED));
    }

    #[tokio::test]
    async fn foreign_base_url_is_rejected() {
        let (_dir, cfg) = setup(&["ok.js"]);
        let req = StartRunRequest::new("ok.js").with_param("BASE_URL", "http://evil.example");

        let err = validate(req, &cfg).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "BASE_URL must be http://backend:8080",
        );
    }

    #[tokio::test]
    async fn base_url_comparison_is_exact() {
        let (_dir, cfg) = setup(&["ok.js"]);
        for near in ["http://backend:8080/", "HTTP://backend:8080", " http://backend:8080"] {
            let req = StartRunRequest::new("ok.js").with_param("BASE_URL", near);
            assert!(validate(req, &cfg).await.is_err(), "{near:?} must not pass");
        }
    }
}
