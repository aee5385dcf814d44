use bollard::container::LogOutput;

use k6r_core::{OutputFrame, OutputKind};

/// Translate one chunk of attached exec output; stdin echoes are skipped.
pub fn output_frame(out: LogOutput) -> Option<OutputFrame> {
    let (kind, payload) = match out {
        LogOutput::StdOut { message } => (OutputKind::Stdout, message),
        LogOutput::StdErr { message } => (OutputKind::Stderr, message),
        LogOutput::Console { message } => (OutputKind::Console, message),
        LogOutput::StdIn { .. } => return None,
    };
    Some(OutputFrame { kind, payload })
}
