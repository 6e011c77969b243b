// Test mocks for the audit pipeline.
//
// One mock per trait boundary:
// - MockRegistry (RegistrySource) — fixed pages, optionally failing
// - MockTwitter (TwitterApi) — screen name → user
// - MockFacebook (FacebookApi) — URL → object, id → page details
// - FixedClock (Clock)
//
// Plus helpers for constructing registry records and platform payloads.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use platform_client::{
    Feed, FeedPost, GraphObject, PageDetails, TweetStatus, TwitterUser, REASON_ALIAS_MISSING,
};
use registry_client::{PageMetadata, RegistryPage, RegistryRecord};

use crate::error::LookupError;
use crate::traits::{Clock, FacebookApi, RegistrySource, TwitterApi};

// ---------------------------------------------------------------------------
// MockRegistry
// ---------------------------------------------------------------------------

/// Serves `pages[n - 1]` for page `n`, advertising `pages.len()` pages.
pub struct MockRegistry {
    pages: Vec<Vec<RegistryRecord>>,
    failing: HashSet<u32>,
    calls: Mutex<Vec<u32>>,
}

impl MockRegistry {
    pub fn new(pages: Vec<Vec<RegistryRecord>>) -> Self {
        Self {
            pages,
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing.insert(page);
        self
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistrySource for MockRegistry {
    async fn fetch_page(&self, page: u32) -> Result<RegistryPage> {
        self.calls.lock().unwrap().push(page);
        if self.failing.contains(&page) {
            bail!("HTTP 429: rate limit exceeded");
        }
        let Some(results) = (page as usize).checked_sub(1).and_then(|i| self.pages.get(i)) else {
            bail!("no such page: {page}");
        };
        Ok(RegistryPage {
            metadata: PageMetadata {
                pages: self.pages.len() as u32,
            },
            results: results.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// MockTwitter
// ---------------------------------------------------------------------------

/// Resolves registered users case-insensitively. A batch containing a
/// `failing_on` handle fails as if the service were down.
pub struct MockTwitter {
    users: HashMap<String, TwitterUser>,
    failing: HashSet<String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockTwitter {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_user(mut self, user: TwitterUser) -> Self {
        self.users.insert(user.screen_name.to_lowercase(), user);
        self
    }

    pub fn failing_on(mut self, handle: &str) -> Self {
        self.failing.insert(handle.to_lowercase());
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockTwitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TwitterApi for MockTwitter {
    async fn users_lookup(
        &self,
        screen_names: &[String],
    ) -> std::result::Result<Vec<TwitterUser>, LookupError> {
        self.calls.lock().unwrap().push(screen_names.to_vec());
        if screen_names
            .iter()
            .any(|name| self.failing.contains(&name.to_lowercase()))
        {
            return Err(LookupError::Upstream("HTTP 503: over capacity".into()));
        }
        Ok(screen_names
            .iter()
            .filter_map(|name| self.users.get(&name.to_lowercase()).cloned())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockFacebook
// ---------------------------------------------------------------------------

/// URL lookups answer from `with_url`; detail lookups from `with_details`.
/// A batch containing a `rejecting_alias` URL fails with the Graph API's
/// missing-alias error naming every such URL in the batch. A detail batch
/// containing a `failing_on` id fails as if the service were down.
pub struct MockFacebook {
    objects: HashMap<String, GraphObject>,
    details: HashMap<String, PageDetails>,
    rejected: HashSet<String>,
    failing: HashSet<String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockFacebook {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            details: HashMap::new(),
            rejected: HashSet::new(),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_url(mut self, url: &str, object: GraphObject) -> Self {
        self.objects.insert(url.to_string(), object);
        self
    }

    pub fn with_details(mut self, id: &str, details: PageDetails) -> Self {
        self.details.insert(id.to_string(), details);
        self
    }

    pub fn rejecting_alias(mut self, url: &str) -> Self {
        self.rejected.insert(url.to_string());
        self
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockFacebook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FacebookApi for MockFacebook {
    async fn objects_by_url(
        &self,
        urls: &[String],
    ) -> std::result::Result<HashMap<String, GraphObject>, LookupError> {
        self.calls.lock().unwrap().push(urls.to_vec());
        let rejected: Vec<String> = urls
            .iter()
            .filter(|url| self.rejected.contains(*url))
            .cloned()
            .collect();
        if !rejected.is_empty() {
            return Err(LookupError::BadIdentifiers {
                reason: REASON_ALIAS_MISSING.to_string(),
                identifiers: rejected,
            });
        }
        Ok(urls
            .iter()
            .filter_map(|url| Some((url.clone(), self.objects.get(url)?.clone())))
            .collect())
    }

    async fn page_details(
        &self,
        ids: &[String],
    ) -> std::result::Result<HashMap<String, PageDetails>, LookupError> {
        self.calls.lock().unwrap().push(ids.to_vec());
        if ids.iter().any(|id| self.failing.contains(id)) {
            return Err(LookupError::Upstream("HTTP 500: unknown error".into()));
        }
        Ok(ids
            .iter()
            .filter_map(|id| Some((id.clone(), self.details.get(id)?.clone())))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// FixedClock
// ---------------------------------------------------------------------------

pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn registry_record(
    id: i64,
    service_key: &str,
    service_url: &str,
    account: Option<&str>,
) -> RegistryRecord {
    RegistryRecord {
        id,
        service_key: service_key.into(),
        service_url: Some(service_url.to_string()),
        account: account.map(str::to_string),
        created_at: None,
        updated_at: None,
        extra: Default::default(),
    }
}

/// A user whose latest tweet (if any) was posted at `last_tweet`, written in
/// Twitter's `created_at` format.
pub fn twitter_user(
    screen_name: &str,
    id: &str,
    verified: bool,
    last_tweet: Option<&str>,
) -> TwitterUser {
    TwitterUser {
        id: id.parse().ok(),
        id_str: Some(id.to_string()),
        screen_name: screen_name.to_string(),
        name: Some(screen_name.to_string()),
        verified,
        protected: false,
        created_at: None,
        followers_count: None,
        statuses_count: None,
        status: last_tweet.map(|at| TweetStatus {
            id_str: None,
            created_at: Some(at.to_string()),
            text: None,
        }),
        extra: Default::default(),
    }
}

pub fn graph_object(id: &str, name: Option<&str>) -> GraphObject {
    GraphObject {
        id: Some(id.to_string()),
        name: name.map(str::to_string),
        extra: Default::default(),
    }
}

/// Page details with an optional latest post in Graph's `created_time` format.
pub fn page_details(id: &str, name: &str, verified: bool, last_post: Option<&str>) -> PageDetails {
    PageDetails {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        username: None,
        link: None,
        is_verified: Some(verified),
        verification_status: None,
        fan_count: None,
        feed: last_post.map(|at| Feed {
            data: vec![FeedPost {
                id: None,
                created_time: Some(at.to_string()),
                story: None,
                status_type: None,
                permalink_url: None,
            }],
        }),
        extra: Default::default(),
    }
}
