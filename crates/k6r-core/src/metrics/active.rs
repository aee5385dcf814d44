use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use crate::metrics::backend::ActiveGauge;

/// Shared count of runs currently executing.
#[derive(Debug, Clone, Default)]
pub struct ActiveRuns(Arc<AtomicI64>);

impl ActiveRuns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more active run until the returned guard is dropped.
    #[must_use = "the run is only counted while the guard is alive"]
    pub fn enter(&self) -> ActiveGuard {
        self.0.fetch_add(1, Ordering::AcqRel);
        ActiveGuard(Arc::clone(&self.0))
    }

    pub fn current(&self) -> i64 {
        self.0.load(Ordering::Acquire)
    }

    /// Read callback suitable for [`crate::MetricsBackend::bind_active_gauge`].
    pub fn gauge(&self) -> ActiveGauge {
        let counter = Arc::clone(&self.0);
        Arc::new(move || counter.load(Ordering::Acquire))
    }
}

/// Decrements the active-run count on drop.
#[derive(Debug)]
pub struct ActiveGuard(Arc<AtomicI64>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn guard_restores_count() {
        let active = ActiveRuns::new();
        let gauge = active.gauge();
        {
            let _a = active.enter();
            let _b = active.enter();
            assert_eq!(active.current(), 2);
            assert_eq!(gauge(), 2);
        }
        assert_eq!(gauge(), 0);
    }

    #[test]
    fn guard_is_released_on_panic() {
        let active = ActiveRuns::new();
        let cloned = active.clone();
        let res = thread::spawn(move || {
            let _g = cloned.enter();
            panic!("boom");
        })
        .join();

        assert!(res.is_err());
        assert_eq!(active.current(), 0);
    }

    #[test]
    fn parallel_enter_exit_balances() {
        let active = ActiveRuns::new();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let active = active.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        let _g = active.enter();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(active.current(), 0);
    }
}
