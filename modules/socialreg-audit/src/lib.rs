pub mod chunked;
pub mod error;
pub mod pipeline;
pub mod platforms;
pub mod recency;
pub mod reconcile;
pub mod registry;
pub mod snapshot;
pub mod stats;
pub mod table;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod username;

pub use error::{AuditError, LookupError, Result, SnapshotError};
pub use pipeline::{AuditPipeline, AuditReport, PlatformReport, StageModes};
pub use platforms::{Platform, PlatformProfile};
pub use reconcile::{ErrorKind, ErrorRecord, MergedRow};
pub use snapshot::{SnapshotKind, SnapshotStore};
pub use stats::StatsReport;
pub use table::{Table, Tabular};
