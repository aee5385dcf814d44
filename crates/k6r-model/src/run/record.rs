use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{ModelError, ModelResult, Params, RunId, RunStatus};

/// In-memory record of one submitted run.
///
/// `id`, `script`, `params`, `start` and `summary_path` are fixed at submission.
/// `status` and `end` change only through [`RunRecord::advance`], which keeps them consistent:
/// `end` is present if and only if the status is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: RunId,
    pub script: String,
    pub params: Params,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
    pub status: RunStatus,
    pub summary_path: Option<PathBuf>,
}

impl RunRecord {
    /// Build a freshly accepted record in the `Queued` state.
    pub fn queued(
        id: RunId,
        script: impl Into<String>,
        params: Params,
        summary_path: PathBuf,
        start: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            script: script.into(),
            params,
            start,
            end: None,
            status: RunStatus::Queued,
            summary_path: Some(summary_path),
        }
    }

    /// Move to `next`, stamping `end` when `next` is terminal.
    ///
    /// `end` is clamped so it is never earlier than `start`.
    pub fn advance(&mut self, next: RunStatus, at: OffsetDateTime) -> ModelResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(ModelError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        if next.is_terminal() {
            self.end = Some(at.max(self.start));
        }
        self.status = next;
        Ok(())
    }

    pub fn summary_path(&self) -> Option<&Path> {
        self.summary_path.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn record() -> RunRecord {
        RunRecord::queued(
            RunId::from("r1"),
            "ok.js",
            Params::new(),
            PathBuf::from("/data/runs/r1.json"),
            OffsetDateTime::UNIX_EPOCH + Duration::hours(1),
        )
    }

    #[test]
    fn queued_record_has_no_end() {
        let r = record();
        assert_eq!(r.status, RunStatus::Queued);
        assert!(r.end.is_none());
        assert_eq!(r.summary_path(), Some(Path::new("/data/runs/r1.json")));
    }

    #[test]
    fn terminal_advance_sets_end() {
        let mut r = record();
        let at = r.start + Duration::seconds(5);
        r.advance(RunStatus::Running, r.start).unwrap();
        assert!(r.end.is_none());

        r.advance(RunStatus::Succeeded, at).unwrap();
        assert_eq!(r.end, Some(at));
    }

    #[test]
    fn end_is_clamped_to_start() {
        let mut r = record();
        r.advance(RunStatus::Running, r.start).unwrap();
        r.advance(RunStatus::Failed, r.start - Duration::seconds(3)).unwrap();
        assert_eq!(r.end, Some(r.start));
    }

    #[test]
    fn illegal_advance_leaves_record_untouched() {
        let mut r = record();
        let err = r.advance(RunStatus::Succeeded, r.start).unwrap_err();
        assert_eq!(
            err,
            ModelError::IllegalTransition {
                from: RunStatus::Queued,
                to: RunStatus::Succeeded
            }
        );
        assert_eq!(r.status, RunStatus::Queued);
        assert!(r.end.is_none());
    }

    #[test]
    fn serializes_camel_case_with_null_end() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["status"], "QUEUED");
        assert_eq!(json["summaryPath"], "/data/runs/r1.json");
        assert!(json["end"].is_null());
        assert_eq!(json["start"], "1970-01-01T01:00:00Z");

        let back: RunRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record());
    }
}
