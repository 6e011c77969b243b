// Platform-specific fetchers. Each one knows how to batch its API, persist
// the raw results as snapshots, and reduce them to `PlatformProfile`s.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use registry_client::ServiceKey;

use crate::chunked::FetchOutcome;

pub mod facebook;
pub mod twitter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Twitter,
    Facebook,
}

impl Platform {
    pub fn from_service_key(key: &ServiceKey) -> Option<Self> {
        match key {
            ServiceKey::Twitter => Some(Platform::Twitter),
            ServiceKey::Facebook => Some(Platform::Facebook),
            ServiceKey::Other(_) => None,
        }
    }

    pub fn domain(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter.com",
            Platform::Facebook => "facebook.com",
        }
    }

    pub fn service_key(&self) -> ServiceKey {
        match self {
            Platform::Twitter => ServiceKey::Twitter,
            Platform::Facebook => ServiceKey::Facebook,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_key().as_str())
    }
}

/// A fetch result stamped with when it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSnapshot<R> {
    /// Older snapshots may lack this; callers fall back to the clock.
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub outcome: FetchOutcome<R>,
}

impl<R> PlatformSnapshot<R> {
    pub fn new(fetched_at: DateTime<Utc>, outcome: FetchOutcome<R>) -> Self {
        Self {
            fetched_at: Some(fetched_at),
            outcome,
        }
    }
}

/// The common shape both platforms are reduced to before joining with the
/// registry.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformProfile {
    /// Lower-cased handle (Twitter) or canonical profile URL (Facebook).
    /// `None` for records that can only be reached by platform id.
    pub join_key: Option<String>,
    pub platform_id: Option<String>,
    pub screen_name: Option<String>,
    pub display_name: Option<String>,
    pub verified: bool,
    pub last_posted_at: Option<DateTime<Utc>>,
    /// False when the platform answered but the object is not a usable page.
    pub valid: bool,
    pub error: Option<String>,
}
