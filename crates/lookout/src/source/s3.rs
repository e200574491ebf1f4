use crate::errors::WatchError;
use crate::source::{Delta, Source};
use async_trait::async_trait;

#[cfg(feature = "s3")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "s3")]
use parking_lot::Mutex;

/// ETag-based source over one remote object. Polling asks the store for the
/// object's metadata tag; the body is transferred only when the tag moved
/// past the one seen on the previous poll. The stored tag advances as soon
/// as it is observed, so a failed body fetch does not replay as a change.
#[cfg(feature = "s3")]
pub struct S3Source {
    client: S3Client,
    bucket: String,
    key: String,
    last_tag: Mutex<Option<String>>,
}

#[cfg(feature = "s3")]
impl S3Source {
    pub fn new(client: S3Client, bucket: &str, key: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            key: key.to_string(),
            last_tag: Mutex::new(None),
        }
    }

    pub async fn from_env(bucket: &str, key: &str) -> Self {
        let shared = aws_config::from_env().load().await;
        Self::new(S3Client::new(&shared), bucket, key)
    }

    fn object(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

#[cfg(feature = "s3")]
#[async_trait]
impl Source for S3Source {
    async fn poll(&self) -> Result<Delta, WatchError> {
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await
            .map_err(|err| {
                WatchError::source_unavailable(&format!("head {}: {err}", self.object()))
            })?;
        let tag = head.e_tag().unwrap_or_default().to_string();

        let previous = self.last_tag.lock().replace(tag.clone());
        if previous.as_deref() == Some(tag.as_str()) {
            return Ok(Delta::Unchanged);
        }

        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await
            .map_err(|err| {
                WatchError::source_unavailable(&format!("get {}: {err}", self.object()))
            })?;
        let bytes = object
            .body
            .collect()
            .await
            .map_err(|err| {
                WatchError::source_unavailable(&format!("read {}: {err}", self.object()))
            })?
            .into_bytes();
        Ok(Delta::Changed(bytes))
    }
}

#[cfg(not(feature = "s3"))]
pub struct S3Source {
    bucket: String,
    key: String,
}

#[cfg(not(feature = "s3"))]
impl S3Source {
    pub async fn from_env(bucket: &str, key: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

#[cfg(not(feature = "s3"))]
#[async_trait]
impl Source for S3Source {
    async fn poll(&self) -> Result<Delta, WatchError> {
        Err(WatchError::feature_disabled(
            "s3",
            &format!(
                "enable the 's3' feature on lookout to poll s3://{}/{}",
                self.bucket, self.key
            ),
        ))
    }
}
