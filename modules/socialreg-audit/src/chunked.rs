// Chunked fetching: split identifiers into API-sized batches, one request per
// batch, excising identifiers the platform rejects and retrying the rest.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LookupError;

/// Reason recorded for identifiers a successful batch call did not return.
pub const NOT_RETURNED: &str = "not returned by platform";

/// One batch call against a platform API. The result is keyed by the
/// identifiers exactly as they appear in `batch`.
#[async_trait]
pub trait BatchLookup: Send + Sync {
    type Record: Send;

    async fn lookup(
        &self,
        batch: &[String],
    ) -> Result<HashMap<String, Self::Record>, LookupError>;
}

/// Every requested identifier ends up in exactly one of the two maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "R: Deserialize<'de>"))]
pub struct FetchOutcome<R> {
    #[serde(default)]
    pub records: BTreeMap<String, R>,
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

impl<R> Default for FetchOutcome<R> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }
}

/// A fetch stopped by a non-recoverable error. Batches completed before the
/// failure are kept in `partial`.
#[derive(Debug)]
pub struct FetchAborted<R> {
    pub partial: FetchOutcome<R>,
    pub error: LookupError,
}

pub struct ChunkedFetcher {
    label: &'static str,
    batch_size: usize,
}

impl ChunkedFetcher {
    pub fn new(label: &'static str, batch_size: usize) -> Self {
        Self {
            label,
            batch_size: batch_size.max(1),
        }
    }

    /// Fetch every identifier, one batch at a time.
    pub async fn fetch<L>(
        &self,
        ids: &[String],
        lookup: &L,
    ) -> Result<FetchOutcome<L::Record>, FetchAborted<L::Record>>
    where
        L: BatchLookup + ?Sized,
    {
        let ids = dedupe_ids(ids);
        let chunks: Vec<Vec<String>> = ids.chunks(self.batch_size).map(<[String]>::to_vec).collect();
        let total_chunks = chunks.len();

        info!(
            platform = self.label,
            total_items = ids.len(),
            total_chunks,
            "Calling platform API"
        );

        let mut outcome = FetchOutcome::default();

        for (i, mut batch) in chunks.into_iter().enumerate() {
            debug!(platform = self.label, chunk = i + 1, total_chunks, "Processing chunk");

            while !batch.is_empty() {
                match lookup.lookup(&batch).await {
                    Ok(mut found) => {
                        for id in batch.drain(..) {
                            match found.remove(&id) {
                                Some(record) => {
                                    outcome.records.insert(id, record);
                                }
                                None => {
                                    outcome.errors.insert(id, NOT_RETURNED.to_string());
                                }
                            }
                        }
                    }
                    Err(LookupError::BadIdentifiers {
                        reason,
                        identifiers,
                    }) => {
                        let removed = remove_identifiers(&mut batch, &identifiers);
                        if removed.is_empty() {
                            return Err(FetchAborted {
                                partial: outcome,
                                error: LookupError::NoProgress {
                                    reason,
                                    identifiers,
                                },
                            });
                        }
                        warn!(
                            platform = self.label,
                            removed = ?removed,
                            reason = reason.as_str(),
                            remaining = batch.len(),
                            "Removed bad identifiers from chunk"
                        );
                        for id in removed {
                            outcome.errors.insert(id, reason.clone());
                        }
                    }
                    Err(error) => {
                        warn!(
                            platform = self.label,
                            chunk = i + 1,
                            total_chunks,
                            error = %error,
                            "Platform fetch aborted"
                        );
                        return Err(FetchAborted {
                            partial: outcome,
                            error,
                        });
                    }
                }
            }
        }

        info!(
            platform = self.label,
            found = outcome.records.len(),
            errors = outcome.errors.len(),
            "Platform fetch complete"
        );
        Ok(outcome)
    }
}

/// Trim, drop blanks and deduplicate, keeping first-seen order.
pub fn dedupe_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}

/// Remove each named identifier from `batch`, matching exactly first and then
/// ignoring surrounding whitespace. Batches built by `fetch` are already
/// trimmed; the fallback covers lookups that echo names back padded.
/// Returns the batch entries removed.
fn remove_identifiers(batch: &mut Vec<String>, named: &[String]) -> Vec<String> {
    let mut removed = Vec::new();
    for name in named {
        let position = batch
            .iter()
            .position(|id| id == name)
            .or_else(|| batch.iter().position(|id| id.trim() == name.trim()));
        if let Some(pos) = position {
            removed.push(batch.remove(pos));
        }
    }
    removed
}
