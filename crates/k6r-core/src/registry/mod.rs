//! In-memory run registry.
//!
//! Append-only for the life of the process: records are inserted on submission and then only advanced
//! through their lifecycle. Every access takes the lock for a single map operation, never across an `.await`.
use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use thiserror::Error;
use time::OffsetDateTime;
use tracing::trace;

use k6r_model::{ModelError, RunId, RunRecord, RunStatus};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("run id already registered: {0}")]
    Duplicate(RunId),

    #[error("unknown run id: {0}")]
    Unknown(RunId),

    #[error("run {id}: {source}")]
    Transition {
        id: RunId,
        #[source]
        source: ModelError,
    },
}

/// Concurrent map of run records keyed by [`RunId`].
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: RwLock<HashMap<RunId, RunRecord>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record; an existing id is never overwritten.
    pub fn insert(&self, record: RunRecord) -> Result<(), RegistryError> {
        let mut runs = self.runs.write().unwrap_or_else(PoisonError::into_inner);
        if runs.contains_key(&record.id) {
            return Err(RegistryError::Duplicate(record.id));
        }
        trace!(run = %record.id, "run registered");
        runs.insert(record.id.clone(), record);
        Ok(())
    }

    /// Snapshot of a single record.
    pub fn get(&self, id: &RunId) -> Option<RunRecord> {
        self.runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Snapshot of all records, most recent `start` first.
    ///
    /// Records sharing a start instant are ordered by id so repeated listings are stable.
    pub fn list(&self) -> Vec<RunRecord> {
        let mut out: Vec<RunRecord> = self
            .runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        out.sort_by(|a, b| b.start.cmp(&a.start).then_with(|| a.id.cmp(&b.id)));
        out
    }

    /// Advance a record to `next`.
    ///
    /// Status and `end` are written under the same write lock, so readers never observe
    /// a terminal status without `end` or the reverse. Returns the updated snapshot.
    pub fn transition(
        &self,
        id: &RunId,
        next: RunStatus,
        at: OffsetDateTime,
    ) -> Result<RunRecord, RegistryError> {
        let mut runs = self.runs.write().unwrap_or_else(PoisonError::into_inner);
        let record = runs
            .get_mut(id)
            .ok_or_else(|| RegistryError::Unknown(id.clone()))?;

        record
            .advance(next, at)
            .map_err(|source| RegistryError::Transition {
                id: id.clone(),
                source,
            })?;
        trace!(run = %id, status = %next, "run status updated");
        Ok(record.clone())
    }

    pub fn len(&self) -> usize {
        self.runs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{path::PathBuf, sync::Arc, thread};
    use time::Duration;

    use k6r_model::Params;

    fn rec(id: &str, start_secs: i64) -> RunRecord {
        RunRecord::queued(
            RunId::from(id),
            "ok.js",
            Params::new(),
            PathBuf::from(format!("/data/runs/{id}.json")),
            OffsetDateTime::UNIX_EPOCH + Duration::seconds(start_secs),
        )
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let reg = RunRegistry::new();
        reg.insert(rec("a", 1)).unwrap();

        let err = reg.insert(rec("a", 2)).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(id) if id.as_str() == "a"));
        assert_eq!(reg.get(&RunId::from("a")).unwrap().start.unix_timestamp(), 1);
    }

    #[test]
    fn get_unknown_is_none() {
        let reg = RunRegistry::new();
        assert!(reg.get(&RunId::from("nope")).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn list_is_most_recent_first() {
        let reg = RunRegistry::new();
        reg.insert(rec("old", 10)).unwrap();
        reg.insert(rec("new", 30)).unwrap();
        reg.insert(rec("mid", 20)).unwrap();

        let ids: Vec<_> = reg.list().into_iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn transition_sets_end_only_on_terminal() {
        let reg = RunRegistry::new();
        let id = RunId::from("r");
        reg.insert(rec("r", 5)).unwrap();
        let at = OffsetDateTime::UNIX_EPOCH + Duration::seconds(9);

        let running = reg.transition(&id, RunStatus::Running, at).unwrap();
        assert_eq!(running.status, RunStatus::Running);
        assert!(running.end.is_none());

        let done = reg.transition(&id, RunStatus::Failed, at).unwrap();
        assert_eq!(done.end, Some(at));
        assert_eq!(reg.get(&id).unwrap(), done);
    }

    #[test]
    fn transition_refuses_to_leave_terminal_state() {
        let reg = RunRegistry::new();
        let id = RunId::from("r");
        let at = OffsetDateTime::UNIX_EPOCH;
        reg.insert(rec("r", 0)).unwrap();
        reg.transition(&id, RunStatus::Running, at).unwrap();
        reg.transition(&id, RunStatus::Succeeded, at).unwrap();

        for next in [RunStatus::Queued, RunStatus::Running, RunStatus::Failed] {
            let err = reg.transition(&id, next, at).unwrap_err();
            assert!(matches!(err, RegistryError::Transition { .. }));
        }
        assert_eq!(reg.get(&id).unwrap().status, RunStatus::Succeeded);
    }

    #[test]
    fn transition_unknown_id_fails() {
        let reg = RunRegistry::new();
        let err = reg
            .transition(&RunId::from("x"), RunStatus::Running, OffsetDateTime::UNIX_EPOCH)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unknown(_)));
    }

    #[test]
    fn concurrent_inserts_are_all_listed_once() {
        let reg = Arc::new(RunRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    for i in 0..50 {
                        reg.insert(rec(&format!("t{t}-{i}"), t * 100 + i)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let list = reg.list();
        assert_eq!(list.len(), 400);
        assert!(list.windows(2).all(|w| w[0].start >= w[1].start));

        let mut ids: Vec<_> = list.iter().map(|r| r.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 400);
    }
}
