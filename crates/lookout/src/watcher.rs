use crate::errors::WatchError;
use crate::metrics::{RefreshSnapshot, RefreshStats};
use crate::source::{Delta, Source};
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type ParseFn<T> = Box<dyn Fn(&[u8]) -> Result<T, WatchError> + Send + Sync>;

/// Hot-reloading holder of one parsed snapshot. The snapshot starts as the
/// caller's fallback and is only ever replaced wholesale by a refresh that
/// fetched and parsed new content; readers always observe a complete value.
/// Failures leave whatever was being served in place.
pub struct Watcher<T> {
    component: String,
    snapshot: RwLock<Arc<T>>,
    source: Arc<dyn Source>,
    parse: ParseFn<T>,
    healthy: AtomicBool,
    stats: RefreshStats,
}

impl<T> Watcher<T> {
    /// Builds the watcher and runs one refresh before returning, so callers
    /// never see an unpopulated state. An initial refresh failure leaves the
    /// fallback in place and is expected enough to warrant only a warning.
    pub async fn new<F, P>(
        component: &str,
        fallback: F,
        source: Arc<dyn Source>,
        parse: P,
    ) -> Self
    where
        F: FnOnce() -> T,
        P: Fn(&[u8]) -> Result<T, WatchError> + Send + Sync + 'static,
    {
        let watcher = Self {
            component: component.to_string(),
            snapshot: RwLock::new(Arc::new(fallback())),
            source,
            parse: Box::new(parse),
            healthy: AtomicBool::new(false),
            stats: RefreshStats::default(),
        };
        if !watcher.refresh().await {
            tracing::warn!(
                target = "lookout::watch",
                component = %watcher.component,
                "initial load failed, serving fallback",
            );
        }
        watcher
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Applies `transform` to the current snapshot under the shared lock.
    /// The lock is held while `transform` runs, so keep it a cheap
    /// projection. A panic in `transform` propagates to this caller only.
    pub fn read<R>(&self, transform: impl FnOnce(&T) -> R) -> R {
        let guard = self.snapshot.read();
        transform(guard.as_ref())
    }

    /// Current snapshot by handle clone, for callers that want to release
    /// the lock before looking at the value.
    pub fn get(&self) -> Arc<T> {
        self.snapshot.read().clone()
    }

    /// Whether the most recent refresh attempt succeeded. An unchanged poll
    /// counts as success; stale-but-serving is reported through this flag
    /// and nowhere else.
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> RefreshSnapshot {
        self.stats.snapshot()
    }

    /// One refresh attempt: poll the source, parse outside any lock, and
    /// commit under the write lock only for the swap. Returns whether the
    /// attempt succeeded; `false` never disturbs the served snapshot.
    pub async fn refresh(&self) -> bool {
        let delta = match self.source.poll().await {
            Ok(delta) => delta,
            Err(err) => {
                tracing::error!(
                    target = "lookout::watch",
                    component = %self.component,
                    "unable to load data: {err:?}",
                );
                self.stats.record_failure();
                self.healthy.store(false, Ordering::Relaxed);
                return false;
            }
        };

        let raw = match delta {
            Delta::Unchanged => {
                self.stats.record_unchanged();
                self.healthy.store(true, Ordering::Relaxed);
                return true;
            }
            Delta::Changed(raw) => raw,
        };

        let parsed = match catch_unwind(AssertUnwindSafe(|| (self.parse)(&raw))) {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => {
                tracing::error!(
                    target = "lookout::watch",
                    component = %self.component,
                    "unable to update data: {err:?}",
                );
                self.stats.record_failure();
                self.healthy.store(false, Ordering::Relaxed);
                return false;
            }
            Err(payload) => {
                let detail = panic_detail(payload.as_ref());
                tracing::error!(
                    target = "lookout::watch",
                    component = %self.component,
                    "unable to update data: parse panicked: {detail}",
                );
                self.stats.record_failure();
                self.healthy.store(false, Ordering::Relaxed);
                return false;
            }
        };

        {
            let mut guard = self.snapshot.write();
            *guard = Arc::new(parsed);
        }
        tracing::info!(
            target = "lookout::watch",
            component = %self.component,
            "updated data",
        );
        self.stats.record_commit();
        self.healthy.store(true, Ordering::Relaxed);
        true
    }
}

pub(crate) fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::MemorySource;

    struct FailingSource;

    #[async_trait::async_trait]
    impl Source for FailingSource {
        async fn poll(&self) -> Result<Delta, WatchError> {
            Err(WatchError::source_unavailable("backing store offline"))
        }
    }

    fn utf8(raw: &[u8]) -> Result<String, WatchError> {
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|err| WatchError::parse(&err.to_string()))
    }

    fn fallback() -> String {
        "fallback".to_string()
    }

    #[tokio::test]
    async fn serves_parsed_content_after_initial_load() {
        let source = Arc::new(MemorySource::new());
        source.set("hello world");

        let watcher = Watcher::new("greeter", fallback, source, utf8).await;
        assert_eq!(watcher.read(|value| value.clone()), "hello world");
        assert!(watcher.is_healthy());
        assert_eq!(watcher.stats().commits, 1);
    }

    #[tokio::test]
    async fn serves_fallback_when_nothing_is_published() {
        let source = Arc::new(MemorySource::new());
        let watcher = Watcher::new("greeter", fallback, source, utf8).await;

        assert_eq!(watcher.read(|value| value.clone()), "fallback");
        assert!(watcher.is_healthy());
        assert_eq!(watcher.stats().unchanged, 1);
    }

    #[tokio::test]
    async fn serves_fallback_when_the_source_fails() {
        let watcher = Watcher::new("greeter", fallback, Arc::new(FailingSource), utf8).await;

        assert_eq!(watcher.read(|value| value.clone()), "fallback");
        assert!(!watcher.is_healthy());
        assert_eq!(watcher.stats().failures, 1);
    }

    #[tokio::test]
    async fn unchanged_polls_keep_the_exact_snapshot() {
        let source = Arc::new(MemorySource::new());
        source.set("hello world");
        let watcher = Watcher::new("greeter", fallback, source, utf8).await;

        let before = watcher.get();
        assert!(watcher.refresh().await);
        let after = watcher.get();

        assert!(Arc::ptr_eq(&before, &after));
        assert!(watcher.is_healthy());
        assert_eq!(watcher.stats().unchanged, 1);
    }

    #[tokio::test]
    async fn rejected_parse_keeps_the_prior_snapshot_until_recovery() {
        let source = Arc::new(MemorySource::new());
        source.set("valid");
        let watcher = Watcher::new("greeter", fallback, source.clone(), utf8).await;
        assert_eq!(watcher.read(|value| value.clone()), "valid");

        source.set(&b"\xff\xfe"[..]);
        assert!(!watcher.refresh().await);
        assert_eq!(watcher.read(|value| value.clone()), "valid");
        assert!(!watcher.is_healthy());

        source.set("recovered");
        assert!(watcher.refresh().await);
        assert_eq!(watcher.read(|value| value.clone()), "recovered");
        assert!(watcher.is_healthy());
    }

    #[tokio::test]
    async fn panicking_parse_counts_as_a_failed_refresh() {
        let source = Arc::new(MemorySource::new());
        source.set("fine");
        let watcher = Watcher::new(
            "greeter",
            fallback,
            source.clone(),
            |raw: &[u8]| {
                if raw == b"boom" {
                    panic!("transform exploded");
                }
                utf8(raw)
            },
        )
        .await;
        assert_eq!(watcher.read(|value| value.clone()), "fine");

        source.set("boom");
        assert!(!watcher.refresh().await);
        assert_eq!(watcher.read(|value| value.clone()), "fine");
        assert!(!watcher.is_healthy());
        assert_eq!(watcher.stats().failures, 1);
    }

    #[tokio::test]
    async fn reader_panic_reaches_only_that_caller() {
        let source = Arc::new(MemorySource::new());
        source.set("hello world");
        let watcher = Watcher::new("greeter", fallback, source, utf8).await;

        let result = catch_unwind(AssertUnwindSafe(|| {
            watcher.read(|_| -> String { panic!("reader fault") })
        }));
        assert!(result.is_err());

        assert_eq!(watcher.read(|value| value.clone()), "hello world");
        assert!(watcher.refresh().await);
    }

    #[tokio::test]
    async fn stats_tally_every_kind_of_attempt() {
        let source = Arc::new(MemorySource::new());
        source.set("one");
        let watcher = Watcher::new("greeter", fallback, source.clone(), utf8).await;

        watcher.refresh().await;
        source.set(&b"\xff"[..]);
        watcher.refresh().await;
        source.set("two");
        watcher.refresh().await;

        let stats = watcher.stats();
        assert_eq!(stats.commits, 2);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(stats.failures, 1);
    }
}
