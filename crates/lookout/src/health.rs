use crate::watcher::Watcher;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Outcome of one health evaluation: a verdict plus an optional message
/// for monitoring to surface.
#[derive(Clone, Debug, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub message: Option<String>,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            message: None,
        }
    }

    pub fn healthy_with(message: &str) -> Self {
        Self {
            healthy: true,
            message: Some(message.to_string()),
        }
    }

    pub fn unhealthy(message: &str) -> Self {
        Self {
            healthy: false,
            message: Some(message.to_string()),
        }
    }
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn probe(&self) -> HealthReport;
}

/// Named health checks, probed in name order.
#[derive(Default)]
pub struct HealthRegistry {
    checks: Mutex<BTreeMap<String, Arc<dyn HealthCheck>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a check under `name`, replacing any check already held
    /// under that name.
    pub fn register(&self, name: &str, check: Arc<dyn HealthCheck>) {
        self.checks.lock().insert(name.to_string(), check);
    }

    /// Evaluates every registered check. Checks are cloned out of the lock
    /// before any probe is awaited, so a slow probe never blocks
    /// registration.
    pub async fn probe_all(&self) -> Vec<(String, HealthReport)> {
        let checks: Vec<(String, Arc<dyn HealthCheck>)> = self
            .checks
            .lock()
            .iter()
            .map(|(name, check)| (name.clone(), check.clone()))
            .collect();

        let mut reports = Vec::with_capacity(checks.len());
        for (name, check) in checks {
            let report = check.probe().await;
            reports.push((name, report));
        }
        reports
    }
}

/// Liveness reporter over one watcher. Evaluation always reports healthy:
/// a failed refresh degrades to the cached or fallback snapshot rather
/// than service failure, so degradation travels in the message, never in
/// the verdict.
pub struct WatcherCheck<T> {
    watcher: Arc<Watcher<T>>,
}

impl<T> WatcherCheck<T> {
    pub fn new(watcher: Arc<Watcher<T>>) -> Self {
        Self { watcher }
    }
}

#[async_trait]
impl<T: Send + Sync> HealthCheck for WatcherCheck<T> {
    async fn probe(&self) -> HealthReport {
        let fresh = self.watcher.is_healthy();
        tracing::debug!(
            target = "lookout::health",
            component = %self.watcher.component(),
            fresh,
            "health evaluated",
        );
        if fresh {
            HealthReport::healthy()
        } else {
            HealthReport::healthy_with(&format!(
                "Unable to fetch data for {}",
                self.watcher.component()
            ))
        }
    }
}

impl<T: Send + Sync + 'static> Watcher<T> {
    /// Registers this watcher's liveness check under its component name.
    pub fn monitor(self: &Arc<Self>, registry: &HealthRegistry) {
        registry.register(self.component(), Arc::new(WatcherCheck::new(self.clone())));
    }
}
