use crate::errors::WatchError;
use crate::source::{Delta, Source};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Content-hash source over a single local file. Every poll reads the full
/// file, digests it, and reports `Changed` with those bytes when the digest
/// differs from the one stored on the previous poll.
pub struct FileSource {
    path: PathBuf,
    last_digest: Mutex<Option<String>>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_digest: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

#[async_trait]
impl Source for FileSource {
    async fn poll(&self) -> Result<Delta, WatchError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|err| {
            WatchError::source_unavailable(&format!("read {}: {err}", self.path.display()))
        })?;

        let current = digest(&bytes);
        let previous = self.last_digest.lock().replace(current.clone());
        if previous.as_deref() == Some(current.as_str()) {
            return Ok(Delta::Unchanged);
        }
        Ok(Delta::Changed(Bytes::from(bytes)))
    }
}
