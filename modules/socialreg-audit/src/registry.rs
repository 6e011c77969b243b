// Registry loading: page through the directory API or read the last snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use registry_client::RegistryRecord;

use crate::error::{AuditError, Result};
use crate::snapshot::{SnapshotKind, SnapshotStore};
use crate::traits::RegistrySource;

pub struct RegistryService {
    source: Arc<dyn RegistrySource>,
}

impl RegistryService {
    pub fn new(source: Arc<dyn RegistrySource>) -> Self {
        Self { source }
    }

    /// Fetch every page and persist the concatenated records.
    ///
    /// Page 1 tells us how many pages exist; losing it is fatal. A failure on
    /// a later page ends paging early and keeps what was collected.
    pub async fn fetch(&self, store: &SnapshotStore) -> Result<Vec<RegistryRecord>> {
        let first = self
            .source
            .fetch_page(1)
            .await
            .map_err(AuditError::RegistryUnavailable)?;

        let pages = first.metadata.pages.max(1);
        info!(pages, "registry: fetching directory");
        let mut records = first.results;

        for page in 2..=pages {
            match self.source.fetch_page(page).await {
                Ok(next) => records.extend(next.results),
                Err(e) => {
                    warn!(
                        page,
                        pages,
                        error = %e,
                        "registry: failed to fetch page, rate limit may have been exceeded"
                    );
                    break;
                }
            }
        }

        store.save(SnapshotKind::Registry, &records)?;
        log_summary(&records);
        Ok(records)
    }
}

pub fn load(store: &SnapshotStore) -> Result<Vec<RegistryRecord>> {
    let records: Vec<RegistryRecord> = store.load(SnapshotKind::Registry)?;
    log_summary(&records);
    Ok(records)
}

/// Record counts per `service_key`, most common first. Ties keep key order.
pub fn service_key_counts(records: &[RegistryRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.service_key.as_str()).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(key, n)| (key.to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn log_summary(records: &[RegistryRecord]) {
    info!(count = records.len(), "registry: records available");
    for (service_key, count) in service_key_counts(records) {
        info!(service_key = service_key.as_str(), count, "registry: records by service");
    }
}
