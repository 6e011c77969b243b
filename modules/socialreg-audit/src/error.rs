use std::path::PathBuf;

use platform_client::PlatformError;

use crate::snapshot::SnapshotKind;

/// Result type alias for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Registry unavailable: {0:#}")]
    RegistryUnavailable(anyhow::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("No {0} configured; cannot fetch")]
    MissingCollaborator(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("No {kind} snapshot at {}; run a fetch first", path.display())]
    NotFound { kind: SnapshotKind, path: PathBuf },

    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of one batch lookup against a platform API.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// Recoverable: the batch can be retried without `identifiers`.
    #[error("{reason}: {}", identifiers.join(","))]
    BadIdentifiers {
        reason: String,
        identifiers: Vec<String>,
    },

    #[error("Platform rejected identifiers not present in the batch ({reason}): {}", identifiers.join(","))]
    NoProgress {
        reason: String,
        identifiers: Vec<String>,
    },

    #[error("Upstream unavailable: {0}")]
    Upstream(String),
}

impl From<PlatformError> for LookupError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::BadIdentifiers {
                reason,
                identifiers,
            } => LookupError::BadIdentifiers {
                reason,
                identifiers,
            },
            other => LookupError::Upstream(other.to_string()),
        }
    }
}
