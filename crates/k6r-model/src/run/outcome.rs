use crate::RunStatus;

/// Terminal classification of a run, used for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

impl RunOutcome {
    /// Map an exit code reported by the runtime; only `Some(0)` is a success.
    pub fn from_exit_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => RunOutcome::Succeeded,
            _ => RunOutcome::Failed,
        }
    }

    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            RunOutcome::Succeeded => "succeeded",
            RunOutcome::Failed => "failed",
        }
    }

    /// The terminal [`RunStatus`] recorded for this outcome.
    #[inline]
    pub fn status(&self) -> RunStatus {
        match self {
            RunOutcome::Succeeded => RunStatus::Succeeded,
            RunOutcome::Failed => RunStatus::Failed,
        }
    }
}
