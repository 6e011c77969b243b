// Twitter service: users/lookup by handle, 100 per batch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use platform_client::{TwitterUser, TWITTER_LOOKUP_LIMIT};

use crate::chunked::{BatchLookup, ChunkedFetcher};
use crate::error::{LookupError, Result};
use crate::platforms::{PlatformProfile, PlatformSnapshot};
use crate::recency::parse_timestamp;
use crate::snapshot::{SnapshotKind, SnapshotStore};
use crate::traits::{Clock, TwitterApi};

pub type TwitterSnapshot = PlatformSnapshot<TwitterUser>;

/// Adapts `users/lookup` to the batch contract: users are keyed by the
/// requested handle, matched case-insensitively on `screen_name`.
struct HandleLookup<'a> {
    api: &'a dyn TwitterApi,
}

#[async_trait]
impl BatchLookup for HandleLookup<'_> {
    type Record = TwitterUser;

    async fn lookup(
        &self,
        batch: &[String],
    ) -> std::result::Result<HashMap<String, TwitterUser>, LookupError> {
        let mut by_name: HashMap<String, TwitterUser> = self
            .api
            .users_lookup(batch)
            .await?
            .into_iter()
            .map(|user| (user.screen_name.to_lowercase(), user))
            .collect();

        Ok(batch
            .iter()
            .filter_map(|handle| {
                let user = by_name.remove(&handle.to_lowercase())?;
                Some((handle.clone(), user))
            })
            .collect())
    }
}

pub struct TwitterService {
    api: Arc<dyn TwitterApi>,
    fetcher: ChunkedFetcher,
}

impl TwitterService {
    pub fn new(api: Arc<dyn TwitterApi>) -> Self {
        Self {
            api,
            fetcher: ChunkedFetcher::new("twitter", TWITTER_LOOKUP_LIMIT),
        }
    }

    /// Look up every handle and persist the result. On a fatal API error the
    /// batches already fetched are still written before the error returns;
    /// [`load`] reads them back.
    pub async fn fetch(
        &self,
        handles: &[String],
        store: &SnapshotStore,
        clock: &dyn Clock,
    ) -> Result<TwitterSnapshot> {
        let lookup = HandleLookup {
            api: self.api.as_ref(),
        };

        match self.fetcher.fetch(handles, &lookup).await {
            Ok(outcome) => {
                let snapshot = TwitterSnapshot::new(clock.now(), outcome);
                store.save(SnapshotKind::TwitterApi, &snapshot)?;
                info!(
                    found = snapshot.outcome.records.len(),
                    "twitter: found information for screen names"
                );
                Ok(snapshot)
            }
            Err(aborted) => {
                let partial = TwitterSnapshot::new(clock.now(), aborted.partial);
                store.save(SnapshotKind::TwitterApi, &partial)?;
                warn!(
                    kept = partial.outcome.records.len(),
                    "twitter: fetch aborted, partial snapshot saved"
                );
                Err(aborted.error.into())
            }
        }
    }
}

pub fn load(store: &SnapshotStore) -> Result<TwitterSnapshot> {
    let snapshot: TwitterSnapshot = store.load(SnapshotKind::TwitterApi)?;
    info!(
        users = snapshot.outcome.records.len(),
        errors = snapshot.outcome.errors.len(),
        "twitter: loaded snapshot"
    );
    Ok(snapshot)
}

/// One profile per user, keyed by lower-cased screen name.
pub fn profiles(snapshot: &TwitterSnapshot) -> Vec<PlatformProfile> {
    snapshot
        .outcome
        .records
        .values()
        .map(|user| PlatformProfile {
            join_key: Some(user.screen_name.to_lowercase()),
            platform_id: user.platform_id(),
            screen_name: Some(user.screen_name.clone()),
            display_name: user.name.clone(),
            verified: user.verified,
            last_posted_at: user.last_tweet_at().and_then(parse_timestamp),
            valid: true,
            error: None,
        })
        .collect()
}

/// Lookup failures keyed by handle, the Twitter join key.
pub fn lookup_failures(snapshot: &TwitterSnapshot) -> HashMap<String, String> {
    snapshot
        .outcome
        .errors
        .iter()
        .map(|(handle, reason)| (handle.to_lowercase(), reason.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{twitter_user, FixedClock, MockTwitter};
    use chrono::TimeZone;

    #[tokio::test]
    async fn fetch_keys_users_by_requested_handle_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let api = MockTwitter::new()
            .with_user(twitter_user("NASA", "11348282", true, Some("Wed Oct 10 20:19:24 +0000 2018")));
        let clock = FixedClock::at(chrono::Utc.with_ymd_and_hms(2018, 10, 11, 0, 0, 0).unwrap());

        let service = TwitterService::new(Arc::new(api));
        let snapshot = service
            .fetch(&["nasa".to_string(), "ghost".to_string()], &store, &clock)
            .await
            .unwrap();

        assert_eq!(snapshot.outcome.records["nasa"].screen_name, "NASA");
        assert!(snapshot.outcome.errors.contains_key("ghost"));
        assert_eq!(snapshot.fetched_at, Some(clock.now()));

        let reloaded = load(&store).unwrap();
        assert_eq!(reloaded, snapshot);
    }

    #[tokio::test]
    async fn fatal_error_saves_partial_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let api = MockTwitter::new()
            .with_user(twitter_user("gsa", "1", false, None))
            .failing_on("broken");
        let clock = FixedClock::at(chrono::Utc::now());

        let handles: Vec<String> = std::iter::once("gsa".to_string())
            .chain((0..TWITTER_LOOKUP_LIMIT).map(|i| format!("user{i}")))
            .chain(std::iter::once("broken".to_string()))
            .collect();

        let api = Arc::new(api);
        let service = TwitterService::new(api.clone());
        let err = service.fetch(&handles, &store, &clock).await.unwrap_err();
        assert!(err.to_string().contains("Upstream unavailable"));
        assert_eq!(api.calls().len(), 2);

        let partial = load(&store).unwrap();
        assert!(partial.outcome.records.contains_key("gsa"));
        assert!(!partial.outcome.errors.contains_key("broken"));
    }

    #[test]
    fn loads_snapshot_without_errors_or_fetch_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        std::fs::write(
            store.path(SnapshotKind::TwitterApi),
            r#"{"records":{"nasa":{"id_str":"11348282","screen_name":"NASA"}}}"#,
        )
        .unwrap();

        let snapshot = load(&store).unwrap();
        assert_eq!(snapshot.fetched_at, None);
        assert!(snapshot.outcome.errors.is_empty());
        assert_eq!(snapshot.outcome.records["nasa"].screen_name, "NASA");
        assert!(lookup_failures(&snapshot).is_empty());
    }

    #[test]
    fn profiles_lowercase_join_key_and_parse_last_tweet() {
        let mut snapshot = TwitterSnapshot::new(chrono::Utc::now(), Default::default());
        snapshot.outcome.records.insert(
            "usgs".into(),
            twitter_user("USGS", "99", true, Some("Wed Oct 10 20:19:24 +0000 2018")),
        );

        let profiles = profiles(&snapshot);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].join_key.as_deref(), Some("usgs"));
        assert_eq!(profiles[0].screen_name.as_deref(), Some("USGS"));
        assert!(profiles[0].verified);
        assert!(profiles[0].last_posted_at.is_some());
    }
}
