// Facebook service: two Graph API passes, 50 ids per batch.
//   1. profile URL → Graph object (id, name)
//   2. page id → page details (verification, latest post)
// Both passes are snapshotted separately and joined on page id.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use platform_client::{GraphObject, PageDetails, GRAPH_IDS_LIMIT};

use crate::chunked::{BatchLookup, ChunkedFetcher};
use crate::error::{LookupError, Result};
use crate::platforms::{PlatformProfile, PlatformSnapshot};
use crate::recency::parse_timestamp;
use crate::snapshot::{SnapshotKind, SnapshotStore};
use crate::traits::{Clock, FacebookApi};

/// Recorded for URLs the Graph API resolved to something without a name.
pub const PAGE_NOT_AVAILABLE: &str = "page is not available";

#[derive(Debug, Clone, PartialEq)]
pub struct FacebookSnapshots {
    pub urls: PlatformSnapshot<GraphObject>,
    pub details: PlatformSnapshot<PageDetails>,
}

impl FacebookSnapshots {
    /// Recency is measured from when page details were fetched.
    pub fn fetched_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.details.fetched_at.or(self.urls.fetched_at)
    }

    /// Page ids worth a detail lookup: URLs that resolved to a named object.
    pub fn valid_page_ids(&self) -> Vec<String> {
        self.urls
            .outcome
            .records
            .values()
            .filter(|object| object.name.is_some())
            .filter_map(|object| object.id.clone())
            .collect()
    }
}

struct UrlLookup<'a> {
    api: &'a dyn FacebookApi,
}

#[async_trait]
impl BatchLookup for UrlLookup<'_> {
    type Record = GraphObject;

    async fn lookup(
        &self,
        batch: &[String],
    ) -> std::result::Result<HashMap<String, GraphObject>, LookupError> {
        self.api.objects_by_url(batch).await
    }
}

struct DetailLookup<'a> {
    api: &'a dyn FacebookApi,
}

#[async_trait]
impl BatchLookup for DetailLookup<'_> {
    type Record = PageDetails;

    async fn lookup(
        &self,
        batch: &[String],
    ) -> std::result::Result<HashMap<String, PageDetails>, LookupError> {
        self.api.page_details(batch).await
    }
}

pub struct FacebookService {
    api: Arc<dyn FacebookApi>,
    fetcher: ChunkedFetcher,
}

impl FacebookService {
    pub fn new(api: Arc<dyn FacebookApi>) -> Self {
        Self {
            api,
            fetcher: ChunkedFetcher::new("facebook", GRAPH_IDS_LIMIT),
        }
    }

    /// Resolve profile URLs, then fetch details for the valid pages. Each
    /// pass is saved as soon as it finishes. On a fatal API error the aborted
    /// pass is saved with the batches it completed and the error returns;
    /// [`load`] reads both passes back.
    pub async fn fetch(
        &self,
        urls: &[String],
        store: &SnapshotStore,
        clock: &dyn Clock,
    ) -> Result<FacebookSnapshots> {
        let api = self.api.as_ref();

        let url_outcome = match self.fetcher.fetch(urls, &UrlLookup { api }).await {
            Ok(outcome) => outcome,
            Err(aborted) => {
                let partial = PlatformSnapshot::new(clock.now(), aborted.partial);
                store.save(SnapshotKind::FacebookUrl, &partial)?;
                warn!("facebook: URL lookup aborted, partial snapshot saved");
                return Err(aborted.error.into());
            }
        };
        let url_snapshot = PlatformSnapshot::new(clock.now(), url_outcome);
        store.save(SnapshotKind::FacebookUrl, &url_snapshot)?;

        let mut snapshots = FacebookSnapshots {
            urls: url_snapshot,
            details: PlatformSnapshot::new(clock.now(), Default::default()),
        };
        let ids = snapshots.valid_page_ids();
        info!(
            urls = snapshots.urls.outcome.records.len() + snapshots.urls.outcome.errors.len(),
            valid = ids.len(),
            "facebook: resolved profile URLs"
        );

        let detail_outcome = match self.fetcher.fetch(&ids, &DetailLookup { api }).await {
            Ok(outcome) => outcome,
            Err(aborted) => {
                let partial = PlatformSnapshot::new(clock.now(), aborted.partial);
                store.save(SnapshotKind::FacebookId, &partial)?;
                warn!("facebook: detail lookup aborted, partial snapshot saved");
                return Err(aborted.error.into());
            }
        };
        snapshots.details = PlatformSnapshot::new(clock.now(), detail_outcome);
        store.save(SnapshotKind::FacebookId, &snapshots.details)?;
        info!(
            found = snapshots.details.outcome.records.len(),
            "facebook: found information for page ids"
        );

        Ok(snapshots)
    }
}

pub fn load(store: &SnapshotStore) -> Result<FacebookSnapshots> {
    let urls: PlatformSnapshot<GraphObject> = store.load(SnapshotKind::FacebookUrl)?;
    let details: PlatformSnapshot<PageDetails> = store.load(SnapshotKind::FacebookId)?;
    info!(
        urls = urls.outcome.records.len(),
        pages = details.outcome.records.len(),
        "facebook: loaded snapshots"
    );
    Ok(FacebookSnapshots { urls, details })
}

/// Outer join of the URL pass with the detail pass on page id. URLs the
/// Graph API rejected become invalid profiles carrying the reason; details
/// no URL points at are kept without a join key.
pub fn profiles(snapshots: &FacebookSnapshots) -> Vec<PlatformProfile> {
    let details = &snapshots.details.outcome.records;
    let mut referenced: HashSet<&str> = HashSet::new();
    let mut profiles = Vec::new();

    for (url, object) in &snapshots.urls.outcome.records {
        let page = object.id.as_deref().and_then(|id| {
            referenced.insert(id);
            details.get(id)
        });
        let valid = object.name.is_some();

        profiles.push(PlatformProfile {
            join_key: Some(url.clone()),
            platform_id: object.id.clone(),
            screen_name: page.and_then(|p| p.username.clone()),
            display_name: page
                .and_then(|p| p.name.clone())
                .or_else(|| object.name.clone()),
            verified: page.and_then(|p| p.is_verified).unwrap_or(false),
            last_posted_at: page.and_then(|p| p.last_post_at()).and_then(parse_timestamp),
            valid,
            error: (!valid).then(|| PAGE_NOT_AVAILABLE.to_string()),
        });
    }

    for (url, reason) in &snapshots.urls.outcome.errors {
        profiles.push(PlatformProfile {
            join_key: Some(url.clone()),
            platform_id: None,
            screen_name: None,
            display_name: None,
            verified: false,
            last_posted_at: None,
            valid: false,
            error: Some(reason.clone()),
        });
    }

    for (id, page) in details {
        if referenced.contains(id.as_str()) {
            continue;
        }
        profiles.push(PlatformProfile {
            join_key: None,
            platform_id: Some(id.clone()),
            screen_name: page.username.clone(),
            display_name: page.name.clone(),
            verified: page.is_verified.unwrap_or(false),
            last_posted_at: page.last_post_at().and_then(parse_timestamp),
            valid: page.name.is_some(),
            error: None,
        });
    }

    profiles
}

/// Lookup failures keyed by profile URL. Detail-pass failures are traced
/// back to every URL that resolved to the failing page id.
pub fn lookup_failures(snapshots: &FacebookSnapshots) -> HashMap<String, String> {
    let mut failures: HashMap<String, String> = snapshots.urls.outcome.errors.clone().into_iter().collect();

    for (url, object) in &snapshots.urls.outcome.records {
        let Some(id) = object.id.as_deref() else {
            continue;
        };
        if let Some(reason) = snapshots.details.outcome.errors.get(id) {
            failures.insert(url.clone(), reason.clone());
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{graph_object, page_details, FixedClock, MockFacebook};
    use chrono::{TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock::at(Utc.with_ymd_and_hms(2017, 6, 2, 0, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn two_pass_fetch_persists_both_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let api = MockFacebook::new()
            .with_url("https://www.facebook.com/gsa", graph_object("100", Some("GSA")))
            .with_url("https://www.facebook.com/events", graph_object("200", None))
            .with_details("100", page_details("100", "GSA", true, Some("2017-06-01T12:00:00+0000")))
            .rejecting_alias("https://www.facebook.com/gone");

        let api = Arc::new(api);
        let service = FacebookService::new(api.clone());
        let urls = vec![
            "https://www.facebook.com/gsa".to_string(),
            "https://www.facebook.com/events".to_string(),
            "https://www.facebook.com/gone".to_string(),
        ];
        let snapshots = service.fetch(&urls, &store, &clock()).await.unwrap();

        assert_eq!(snapshots.valid_page_ids(), vec!["100".to_string()]);
        assert_eq!(
            snapshots.urls.outcome.errors.get("https://www.facebook.com/gone").map(String::as_str),
            Some(platform_client::REASON_ALIAS_MISSING)
        );
        assert!(snapshots.details.outcome.records.contains_key("100"));
        assert_eq!(load(&store).unwrap(), snapshots);

        // The rejected URL is excised and the rest of the batch re-issued.
        assert_eq!(
            api.calls(),
            vec![
                urls.clone(),
                urls[..2].to_vec(),
                vec!["100".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn detail_pass_failure_keeps_url_pass_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let api = MockFacebook::new()
            .with_url("https://www.facebook.com/gsa", graph_object("100", Some("GSA")))
            .with_url("https://www.facebook.com/usgs", graph_object("200", Some("USGS")))
            .with_details("100", page_details("100", "GSA", true, None))
            .failing_on("200");

        let urls = vec![
            "https://www.facebook.com/gsa".to_string(),
            "https://www.facebook.com/usgs".to_string(),
        ];
        let err = FacebookService::new(Arc::new(api))
            .fetch(&urls, &store, &clock())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Upstream unavailable"));

        let partial = load(&store).unwrap();
        assert_eq!(partial.urls.outcome.records.len(), 2);
        assert!(partial.details.outcome.records.is_empty());
        assert_eq!(partial.fetched_at(), Some(clock().now()));
    }

    #[test]
    fn profiles_join_url_and_detail_passes() {
        let mut snapshots = FacebookSnapshots {
            urls: PlatformSnapshot::new(Utc::now(), Default::default()),
            details: PlatformSnapshot::new(Utc::now(), Default::default()),
        };
        snapshots.urls.outcome.records.insert(
            "https://www.facebook.com/gsa".into(),
            graph_object("100", Some("GSA")),
        );
        snapshots.urls.outcome.records.insert(
            "https://www.facebook.com/about".into(),
            graph_object("300", None),
        );
        snapshots
            .urls
            .outcome
            .errors
            .insert("https://www.facebook.com/gone".into(), "the alias you requested does not exist".into());
        snapshots.details.outcome.records.insert(
            "100".into(),
            page_details("100", "U.S. General Services Administration", true, None),
        );
        snapshots
            .details
            .outcome
            .records
            .insert("999".into(), page_details("999", "Orphan", false, None));

        let profiles = profiles(&snapshots);
        assert_eq!(profiles.len(), 4);

        let gsa = profiles
            .iter()
            .find(|p| p.join_key.as_deref() == Some("https://www.facebook.com/gsa"))
            .unwrap();
        assert!(gsa.valid && gsa.verified);
        assert_eq!(gsa.display_name.as_deref(), Some("U.S. General Services Administration"));

        let about = profiles
            .iter()
            .find(|p| p.join_key.as_deref() == Some("https://www.facebook.com/about"))
            .unwrap();
        assert!(!about.valid);
        assert_eq!(about.error.as_deref(), Some(PAGE_NOT_AVAILABLE));

        let orphan = profiles.iter().find(|p| p.join_key.is_none()).unwrap();
        assert_eq!(orphan.platform_id.as_deref(), Some("999"));
    }

    #[test]
    fn detail_failures_map_back_to_urls() {
        let mut snapshots = FacebookSnapshots {
            urls: PlatformSnapshot::new(Utc::now(), Default::default()),
            details: PlatformSnapshot::new(Utc::now(), Default::default()),
        };
        snapshots.urls.outcome.records.insert(
            "https://www.facebook.com/jdoe".into(),
            graph_object("555", Some("J Doe")),
        );
        snapshots
            .details
            .outcome
            .errors
            .insert("555".into(), "cannot query user by their username".into());

        let failures = lookup_failures(&snapshots);
        assert_eq!(
            failures.get("https://www.facebook.com/jdoe").map(String::as_str),
            Some("cannot query user by their username")
        );
    }
}
