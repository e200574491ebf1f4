pub mod errors;
pub mod health;
pub mod metrics;
pub mod prelude;
pub mod schedule;
pub mod source;
pub mod watcher;

pub use errors::{ErrorKind, WatchError};
pub use health::{HealthCheck, HealthRegistry, HealthReport, WatcherCheck};
pub use metrics::RefreshSnapshot;
pub use schedule::{WatchGuard, WatchOptions};
pub use watcher::Watcher;
