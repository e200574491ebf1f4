use crate::errors::WatchError;
use async_trait::async_trait;
use bytes::Bytes;

pub mod file;
pub mod memory;
pub mod s3;

/// Outcome of one change inspection: either the backing content is the same
/// version the adapter last observed, or it changed and the raw bytes are
/// returned for parsing.
#[derive(Clone, Debug)]
pub enum Delta {
    Unchanged,
    Changed(Bytes),
}

/// A change-aware content source. One inspection per call: report whether
/// the content moved past the fingerprint seen on the previous call and
/// hand back the raw bytes when it did. The first successful call always
/// reports `Changed`.
#[async_trait]
pub trait Source: Send + Sync {
    async fn poll(&self) -> Result<Delta, WatchError>;
}
