use serde::{Deserialize, Serialize};

// --- Twitter ---

/// A user object from `users/lookup`. Unmodelled keys are kept in `extra`
/// so snapshots preserve the full payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitterUser {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub id_str: Option<String>,
    pub screen_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub statuses_count: Option<u64>,
    /// The user's most recent tweet, absent for accounts that never posted.
    #[serde(default)]
    pub status: Option<TweetStatus>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TwitterUser {
    /// Stable platform identity. Prefers `id_str` since numeric ids exceed
    /// what some JSON tooling keeps exact.
    pub fn platform_id(&self) -> Option<String> {
        self.id_str
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| self.id.map(|id| id.to_string()))
    }

    pub fn last_tweet_at(&self) -> Option<&str> {
        self.status.as_ref()?.created_at.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetStatus {
    #[serde(default)]
    pub id_str: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Error envelope returned by the Twitter REST API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TwitterErrorBody {
    #[serde(default)]
    pub errors: Vec<TwitterErrorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TwitterErrorEntry {
    pub code: i64,
}

// --- Facebook Graph ---

/// Minimal object returned when looking up a page by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Page details requested by id with [`PAGE_DETAIL_FIELDS`](crate::PAGE_DETAIL_FIELDS).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDetails {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub verification_status: Option<String>,
    #[serde(default)]
    pub fan_count: Option<u64>,
    #[serde(default)]
    pub feed: Option<Feed>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PageDetails {
    pub fn last_post_at(&self) -> Option<&str> {
        self.feed.as_ref()?.data.first()?.created_time.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    #[serde(default)]
    pub data: Vec<FeedPost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPost {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub story: Option<String>,
    #[serde(default)]
    pub status_type: Option<String>,
    #[serde(default)]
    pub permalink_url: Option<String>,
}

/// Error envelope returned by the Graph API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphErrorBody {
    pub error: GraphErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphErrorDetail {
    #[serde(default)]
    pub message: String,
}
