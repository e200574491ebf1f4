pub use crate::{
    errors::{ErrorKind, WatchError},
    health::{HealthCheck, HealthRegistry, HealthReport, WatcherCheck},
    metrics::RefreshSnapshot,
    schedule::{WatchGuard, WatchOptions},
    source::{file::FileSource, memory::MemorySource, s3::S3Source, Delta, Source},
    watcher::Watcher,
};
