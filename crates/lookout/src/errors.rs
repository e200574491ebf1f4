use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    SourceUnavailable,
    Parse,
    FeatureDisabled,
}

#[derive(Debug, Error)]
#[error("{kind:?}: {detail}")]
pub struct WatchError {
    kind: ErrorKind,
    detail: String,
}

impl WatchError {
    pub fn source_unavailable(detail: &str) -> Self {
        WatchError {
            kind: ErrorKind::SourceUnavailable,
            detail: detail.to_string(),
        }
    }

    pub fn parse(detail: &str) -> Self {
        WatchError {
            kind: ErrorKind::Parse,
            detail: detail.to_string(),
        }
    }

    pub fn feature_disabled(feature: &str, detail: &str) -> Self {
        WatchError {
            kind: ErrorKind::FeatureDisabled,
            detail: format!("feature '{feature}' is disabled: {detail}"),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}
