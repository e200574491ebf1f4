use crate::errors::WatchError;
use crate::source::{Delta, Source};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

/// In-memory source tagged by a monotonically increasing revision. `set`
/// publishes a payload under a fresh revision; polling fingerprints the
/// revision the same way the remote adapter fingerprints object tags, so a
/// re-published payload counts as changed even when the bytes are equal.
#[derive(Default)]
pub struct MemorySource {
    state: Mutex<State>,
    last_seen: Mutex<Option<u64>>,
}

#[derive(Default)]
struct State {
    revision: u64,
    payload: Option<Bytes>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, payload: impl Into<Bytes>) {
        let mut state = self.state.lock();
        state.revision += 1;
        state.payload = Some(payload.into());
    }
}

#[async_trait]
impl Source for MemorySource {
    async fn poll(&self) -> Result<Delta, WatchError> {
        let (revision, payload) = {
            let state = self.state.lock();
            (state.revision, state.payload.clone())
        };
        let Some(payload) = payload else {
            return Ok(Delta::Unchanged);
        };

        let previous = self.last_seen.lock().replace(revision);
        if previous == Some(revision) {
            return Ok(Delta::Unchanged);
        }
        Ok(Delta::Changed(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_source_reports_unchanged() {
        let source = MemorySource::new();
        assert!(matches!(source.poll().await.expect("poll"), Delta::Unchanged));
        assert!(matches!(source.poll().await.expect("poll"), Delta::Unchanged));
    }

    #[tokio::test]
    async fn same_revision_twice_reports_unchanged() {
        let source = MemorySource::new();
        source.set("etag-123");

        assert!(matches!(
            source.poll().await.expect("first poll"),
            Delta::Changed(_)
        ));
        assert!(matches!(
            source.poll().await.expect("second poll"),
            Delta::Unchanged
        ));
    }

    #[tokio::test]
    async fn bumped_revision_reports_changed_with_the_fresh_payload() {
        let source = MemorySource::new();
        source.set("etag-123");
        source.poll().await.expect("first poll");

        source.set("etag-456");
        match source.poll().await.expect("poll after set") {
            Delta::Changed(bytes) => assert_eq!(&bytes[..], b"etag-456"),
            Delta::Unchanged => panic!("new revision must report changed"),
        }
    }

    #[tokio::test]
    async fn republishing_equal_bytes_still_counts_as_changed() {
        let source = MemorySource::new();
        source.set("same");
        source.poll().await.expect("first poll");

        source.set("same");
        assert!(matches!(
            source.poll().await.expect("poll after re-set"),
            Delta::Changed(_)
        ));
    }
}
