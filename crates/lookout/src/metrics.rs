use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub(crate) struct RefreshStats {
    commits: AtomicU64,
    unchanged: AtomicU64,
    failures: AtomicU64,
}

impl RefreshStats {
    pub(crate) fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unchanged(&self) {
        self.unchanged.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> RefreshSnapshot {
        RefreshSnapshot {
            commits: self.commits.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Totals across every refresh attempt since construction, including the
/// constructor's initial load.
#[derive(Clone, Debug, Default)]
pub struct RefreshSnapshot {
    pub commits: u64,
    pub unchanged: u64,
    pub failures: u64,
}
