// Trait abstractions for the pipeline's collaborators.
//
// RegistrySource — one page of the registry directory.
// TwitterApi / FacebookApi — batch lookups that surface bad identifiers as data.
// Clock — the instant a fetch is stamped with.
//
// Real clients implement these below; mocks live in `testing`.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use platform_client::{
    FacebookClient, GraphObject, PageDetails, TwitterClient, TwitterUser, PAGE_DETAIL_FIELDS,
};
use registry_client::{RegistryClient, RegistryPage};

use crate::error::LookupError;

// ---------------------------------------------------------------------------
// RegistrySource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Fetch one 1-based page of the directory.
    async fn fetch_page(&self, page: u32) -> Result<RegistryPage>;
}

#[async_trait]
impl RegistrySource for RegistryClient {
    async fn fetch_page(&self, page: u32) -> Result<RegistryPage> {
        Ok(self.fetch_page(page).await?)
    }
}

// ---------------------------------------------------------------------------
// Platform APIs
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TwitterApi: Send + Sync {
    /// Look up users by screen name. Unknown names are absent from the result.
    async fn users_lookup(
        &self,
        screen_names: &[String],
    ) -> std::result::Result<Vec<TwitterUser>, LookupError>;
}

#[async_trait]
impl TwitterApi for TwitterClient {
    async fn users_lookup(
        &self,
        screen_names: &[String],
    ) -> std::result::Result<Vec<TwitterUser>, LookupError> {
        Ok(self.users_lookup(screen_names).await?)
    }
}

#[async_trait]
pub trait FacebookApi: Send + Sync {
    /// Resolve profile URLs to Graph objects, keyed by the requested URL.
    async fn objects_by_url(
        &self,
        urls: &[String],
    ) -> std::result::Result<HashMap<String, GraphObject>, LookupError>;

    /// Fetch page details (verification, latest post) keyed by page id.
    async fn page_details(
        &self,
        ids: &[String],
    ) -> std::result::Result<HashMap<String, PageDetails>, LookupError>;
}

#[async_trait]
impl FacebookApi for FacebookClient {
    async fn objects_by_url(
        &self,
        urls: &[String],
    ) -> std::result::Result<HashMap<String, GraphObject>, LookupError> {
        Ok(self.get_objects(urls, None).await?)
    }

    async fn page_details(
        &self,
        ids: &[String],
    ) -> std::result::Result<HashMap<String, PageDetails>, LookupError> {
        Ok(self.get_objects(ids, Some(PAGE_DETAIL_FIELDS)).await?)
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
