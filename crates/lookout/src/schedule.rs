use crate::watcher::{panic_detail, Watcher};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Cadence of a scheduled refresh loop: a fixed period with an optional
/// delay before the first refresh.
#[derive(Clone, Copy, Debug)]
pub struct WatchOptions {
    period: Duration,
    initial_delay: Duration,
}

impl WatchOptions {
    pub fn every(period: Duration) -> Self {
        Self {
            period,
            initial_delay: Duration::ZERO,
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }
}

impl<T: Send + Sync + 'static> Watcher<T> {
    /// Spawns one task that refreshes this watcher at the given cadence
    /// until the returned guard is shut down or dropped. Every scheduled
    /// refresh is caught-all at this boundary: a fault `refresh()` itself
    /// did not absorb is logged and the loop keeps ticking. Ticks are
    /// awaited in-loop, so scheduled refreshes never overlap.
    pub fn watch(self: &Arc<Self>, options: WatchOptions) -> WatchGuard {
        let watcher = self.clone();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            if !options.initial_delay.is_zero() {
                tokio::select! {
                    _ = &mut stop_rx => return,
                    _ = tokio::time::sleep(options.initial_delay) => {}
                }
            }
            let mut ticker = interval(options.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if let Err(payload) =
                            AssertUnwindSafe(watcher.refresh()).catch_unwind().await
                        {
                            let detail = panic_detail(payload.as_ref());
                            tracing::error!(
                                target = "lookout::schedule",
                                component = %watcher.component(),
                                "scheduled refresh panicked: {detail}",
                            );
                        }
                    }
                }
            }
        });
        WatchGuard {
            cancel: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running refresh loop. Shutting down (or dropping) the guard
/// stops the loop; a refresh in flight does not outlive `shutdown()`.
pub struct WatchGuard {
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl WatchGuard {
    pub async fn shutdown(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
