pub mod error;
pub mod types;

pub use error::{RegistryError, Result};
pub use types::{PageMetadata, RegistryPage, RegistryRecord, ServiceKey};

/// Public endpoint of the U.S. Digital Registry API.
pub const DEFAULT_BASE_URL: &str = "https://api.gsa.gov/systems/digital-registry/v1";

pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Fetch one page of the social media directory. Page 1 is requested
    /// without a page parameter, matching the endpoint's default.
    pub async fn fetch_page(&self, page: u32) -> Result<RegistryPage> {
        let url = format!("{}/social_media.json", self.base_url);

        let mut query: Vec<(&str, String)> = Vec::new();
        if page > 1 {
            query.push(("page", page.to_string()));
        }
        if let Some(ref key) = self.api_key {
            query.push(("api_key", key.clone()));
        }

        tracing::debug!(page, "Requesting registry page");
        let resp = self.client.get(&url).query(&query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RegistryError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        // Rate-limited responses come back 200 with an error body and no
        // `results`; decoding as text first gives a readable parse error.
        let body = resp.text().await?;
        let page: RegistryPage = serde_json::from_str(&body)?;
        Ok(page)
    }
}
