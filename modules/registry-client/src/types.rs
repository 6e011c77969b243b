use std::fmt;

use serde::{Deserialize, Serialize};

/// Which platform a registry entry claims to be. The registry lists many
/// services; only the ones this crate knows by name get their own variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceKey {
    Twitter,
    Facebook,
    Other(String),
}

impl ServiceKey {
    pub fn as_str(&self) -> &str {
        match self {
            ServiceKey::Twitter => "twitter",
            ServiceKey::Facebook => "facebook",
            ServiceKey::Other(key) => key.as_str(),
        }
    }
}

impl From<String> for ServiceKey {
    fn from(key: String) -> Self {
        match key.as_str() {
            "twitter" => ServiceKey::Twitter,
            "facebook" => ServiceKey::Facebook,
            _ => ServiceKey::Other(key),
        }
    }
}

impl From<&str> for ServiceKey {
    fn from(key: &str) -> Self {
        ServiceKey::from(key.to_string())
    }
}

impl From<ServiceKey> for String {
    fn from(key: ServiceKey) -> Self {
        key.as_str().to_string()
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared account from the `social_media.json` endpoint.
///
/// Keys this crate does not model (agencies, tags, language, ...) are kept in
/// `extra` so a snapshot round-trips without losing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub id: i64,
    pub service_key: ServiceKey,
    #[serde(default)]
    pub service_url: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RegistryRecord {
    pub fn service_url(&self) -> &str {
        self.service_url.as_deref().unwrap_or_default()
    }

    /// The declared account name, treating blank strings as missing.
    pub fn declared_account(&self) -> Option<&str> {
        self.account.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }
}

/// Paging metadata returned alongside every page of results.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMetadata {
    #[serde(default = "default_pages")]
    pub pages: u32,
}

fn default_pages() -> u32 {
    1
}

impl Default for PageMetadata {
    fn default() -> Self {
        Self {
            pages: default_pages(),
        }
    }
}

/// A single page of the registry directory.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryPage {
    #[serde(default)]
    pub metadata: PageMetadata,
    pub results: Vec<RegistryRecord>,
}
