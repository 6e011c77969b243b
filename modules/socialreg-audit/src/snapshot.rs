// Point-in-time JSON snapshots of fetched data, one file per kind.

use std::fmt;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::error::SnapshotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Registry,
    TwitterApi,
    FacebookUrl,
    FacebookId,
}

impl SnapshotKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            SnapshotKind::Registry => "registry_snapshot.json",
            SnapshotKind::TwitterApi => "twitter_api_snapshot.json",
            SnapshotKind::FacebookUrl => "facebook_url_snapshot.json",
            SnapshotKind::FacebookId => "facebook_id_snapshot.json",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SnapshotKind::Registry => "registry",
            SnapshotKind::TwitterApi => "twitter api",
            SnapshotKind::FacebookUrl => "facebook url",
            SnapshotKind::FacebookId => "facebook id",
        };
        f.write_str(name)
    }
}

/// Directory holding the latest snapshot of each kind.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, kind: SnapshotKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub fn exists(&self, kind: SnapshotKind) -> bool {
        self.path(kind).is_file()
    }

    /// Overwrite the snapshot of `kind`, creating the directory if needed.
    pub fn save<T: Serialize + ?Sized>(
        &self,
        kind: SnapshotKind,
        value: &T,
    ) -> Result<PathBuf, SnapshotError> {
        let path = self.path(kind);
        let json = serde_json::to_string_pretty(value)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, json)?;
        info!(%kind, path = %path.display(), "Saved snapshot");
        Ok(path)
    }

    pub fn load<T: DeserializeOwned>(&self, kind: SnapshotKind) -> Result<T, SnapshotError> {
        let path = self.path(kind);
        if !path.is_file() {
            return Err(SnapshotError::NotFound { kind, path });
        }
        let json = std::fs::read_to_string(&path)?;
        let value: T = serde_json::from_str(&json)?;
        Ok(value)
    }
}
