use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::info;

use crate::error::SocialRegError;

/// Whether a stage calls its upstream API or reads the last persisted snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotMode {
    Fetch,
    #[default]
    Load,
}

impl FromStr for SnapshotMode {
    type Err = SocialRegError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fetch" => Ok(SnapshotMode::Fetch),
            "load" => Ok(SnapshotMode::Load),
            other => Err(SocialRegError::Config(format!(
                "expected \"fetch\" or \"load\", got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for SnapshotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotMode::Fetch => f.write_str("fetch"),
            SnapshotMode::Load => f.write_str("load"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Snapshots
    pub data_dir: PathBuf,

    // Registry
    pub registry_base_url: String,
    pub registry_api_key: Option<String>,

    // Platforms
    pub twitter_bearer_token: Option<String>,
    pub facebook_access_token: Option<String>,
    pub facebook_api_version: String,

    // Stage sources
    pub registry_source: SnapshotMode,
    pub twitter_source: SnapshotMode,
    pub facebook_source: SnapshotMode,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, SocialRegError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SocialRegError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mode = |key: &str| -> Result<SnapshotMode, SocialRegError> {
            match get(key) {
                Some(v) => v
                    .parse()
                    .map_err(|e| SocialRegError::Config(format!("{key}: {e}"))),
                None => Ok(SnapshotMode::default()),
            }
        };

        Ok(Self {
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            registry_base_url: get("REGISTRY_BASE_URL")
                .unwrap_or_else(|| registry_client::DEFAULT_BASE_URL.to_string()),
            registry_api_key: get("REGISTRY_API_KEY"),
            twitter_bearer_token: get("TWITTER_BEARER_TOKEN"),
            facebook_access_token: get("FACEBOOK_ACCESS_TOKEN"),
            facebook_api_version: get("FACEBOOK_API_VERSION")
                .unwrap_or_else(|| "2.7".to_string()),
            registry_source: mode("REGISTRY_SOURCE")?,
            twitter_source: mode("TWITTER_SOURCE")?,
            facebook_source: mode("FACEBOOK_SOURCE")?,
        })
    }

    /// Bearer token for the Twitter stage. Only required in fetch mode.
    pub fn twitter_token(&self) -> Result<&str, SocialRegError> {
        self.twitter_bearer_token
            .as_deref()
            .ok_or(SocialRegError::MissingCredential("TWITTER_BEARER_TOKEN"))
    }

    /// Access token for the Facebook stage. Only required in fetch mode.
    pub fn facebook_token(&self) -> Result<&str, SocialRegError> {
        self.facebook_access_token
            .as_deref()
            .ok_or(SocialRegError::MissingCredential("FACEBOOK_ACCESS_TOKEN"))
    }

    /// Log the effective configuration with secrets masked.
    pub fn log_redacted(&self) {
        info!(
            data_dir = %self.data_dir.display(),
            registry_base_url = self.registry_base_url.as_str(),
            registry_api_key = redact(&self.registry_api_key),
            twitter_bearer_token = redact(&self.twitter_bearer_token),
            facebook_access_token = redact(&self.facebook_access_token),
            facebook_api_version = self.facebook_api_version.as_str(),
            registry_source = %self.registry_source,
            twitter_source = %self.twitter_source,
            facebook_source = %self.facebook_source,
            "Loaded config"
        );
    }
}

fn redact(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "[set]",
        None => "[unset]",
    }
}
