use std::borrow::Cow;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use k6r_model::RunId;

use crate::{
    config::OutputConfig,
    runtime::backend::{OutputFrame, OutputKind},
};

/// Tracing target of forwarded container output, filterable on its own (`k6r::output=warn`).
pub const OUTPUT_LOG_TARGET: &str = "k6r::output";

const TRUNCATED_MARKER: &str = " [truncated]";

/// Cut `line` to at most `max` characters, appending a marker when something was dropped.
pub fn truncate_line(line: &str, max: usize) -> Cow<'_, str> {
    match line.char_indices().nth(max) {
        Some((idx, _)) => Cow::Owned(format!("{}{TRUNCATED_MARKER}", &line[..idx])),
        None => Cow::Borrowed(line),
    }
}

/// Drain output frames into the operator log until the pump side closes.
pub(crate) async fn forward_output(
    run_id: RunId,
    mut rx: mpsc::Receiver<OutputFrame>,
    cfg: OutputConfig,
) {
    while let Some(frame) = rx.recv().await {
        let text = String::from_utf8_lossy(&frame.payload);
        for raw in text.lines() {
            if raw.is_empty() {
                continue;
            }
            let line = truncate_line(raw, cfg.max_line_length);
            log_line(&run_id, frame.kind, &line, cfg);
        }
    }
}

fn log_line(run_id: &RunId, kind: OutputKind, line: &str, cfg: OutputConfig) {
    let stream = kind.as_label();
    match kind {
        OutputKind::Stderr if cfg.stderr_warn => {
            warn!(target: OUTPUT_LOG_TARGET, run = %run_id, stream, "{line}")
        }
        OutputKind::Stdout | OutputKind::Console if cfg.stdout_info => {
            info!(target: OUTPUT_LOG_TARGET, run = %run_id, stream, "{line}")
        }
        _ => debug!(target: OUTPUT_LOG_TARGET, run = %run_id, stream, "{line}"),
    }
}
