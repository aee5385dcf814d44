mod cli;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use clap::Parser;
use tracing::{error, info, warn};

use k6r_api::{HttpApi, RunServiceAdapter};
use k6r_core::RunService;
use k6r_exec::docker::DockerExecBackend;
use k6r_observe::{LoggerTimeZone, init_local_offset, init_logger};
use k6r_prometheus::{Encoder, PrometheusMetrics, TextEncoder};

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1) logger, local offset must be read before the runtime spawns threads
    let log_cfg = cli.logger_config();
    if log_cfg.tz == LoggerTimeZone::Local {
        init_local_offset();
    }
    init_logger(&log_cfg)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // 2) metrics + docker backend
    let metrics = Arc::new(PrometheusMetrics::new().context("registering metrics")?);
    let docker_cfg = cli.docker_config()?;
    let backend = DockerExecBackend::connect(&docker_cfg)?;
    if let Err(e) = backend.ping().await {
        warn!(error = %e, "docker daemon not reachable; runs will fail until it is");
    }

    // 3) run service
    let runner_cfg = cli.runner_config();
    info!(
        container = %runner_cfg.k6_container,
        allow_base_url = %runner_cfg.allow_base_url,
        scripts_dir = %runner_cfg.scripts_dir.display(),
        results_dir = %runner_cfg.results_dir.display(),
        workers = runner_cfg.workers(),
        "runner configured"
    );
    let service = Arc::new(RunService::new(
        runner_cfg,
        Arc::new(backend),
        metrics.clone(),
    )?);

    // 4) http
    let app = HttpApi::new(Arc::new(RunServiceAdapter::new(service.clone())))
        .router()
        .merge(
            Router::new()
                .route("/metrics", get(serve_metrics))
                .with_state(metrics),
        );
    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("binding {}", cli.bind))?;
    info!(addr = %cli.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 5) drain workers
    service.shutdown().await;
    info!("bye");
    Ok(())
}

/// GET /metrics
async fn serve_metrics(State(metrics): State<Arc<PrometheusMetrics>>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    match encoder.encode(&metrics.gather(), &mut buf) {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            buf,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown requested");
}
