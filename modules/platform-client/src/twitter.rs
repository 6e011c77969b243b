use std::time::Duration;

use reqwest::StatusCode;

use crate::error::{PlatformError, Result};
use crate::types::{TwitterErrorBody, TwitterUser};

pub const TWITTER_BASE_URL: &str = "https://api.twitter.com";

/// `users/lookup` accepts at most this many screen names per request.
pub const TWITTER_LOOKUP_LIMIT: usize = 100;

/// "No user matches for specified terms."
const NO_USER_MATCHES: i64 = 17;

const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(15 * 60);

/// Consecutive 429s tolerated for one batch before giving up.
const MAX_RATE_LIMIT_WAITS: u32 = 3;

pub struct TwitterClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl TwitterClient {
    pub fn new(bearer_token: String) -> Self {
        Self::with_base_url(TWITTER_BASE_URL, bearer_token)
    }

    pub fn with_base_url(base_url: impl Into<String>, bearer_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token,
        }
    }

    /// Look up users by screen name. Handles the API does not know are simply
    /// missing from the result. Sleeps through rate limits.
    pub async fn users_lookup(&self, screen_names: &[String]) -> Result<Vec<TwitterUser>> {
        if screen_names.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/1.1/users/lookup.json", self.base_url);
        let joined = screen_names.join(",");
        let mut waits = 0;

        loop {
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.bearer_token)
                .query(&[("screen_name", joined.as_str()), ("include_entities", "false")])
                .send()
                .await?;

            let status = resp.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if waits >= MAX_RATE_LIMIT_WAITS {
                    return Err(PlatformError::RateLimited(waits));
                }
                let wait = rate_limit_wait(resp.headers());
                tracing::warn!(wait_secs = wait.as_secs(), "Twitter rate limit hit, sleeping");
                tokio::time::sleep(wait).await;
                waits += 1;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                let body = resp.text().await.unwrap_or_default();
                if is_no_user_matches(&body) {
                    tracing::debug!(count = screen_names.len(), "No users matched batch");
                    return Ok(Vec::new());
                }
                return Err(PlatformError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(PlatformError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let users: Vec<TwitterUser> = resp.json().await?;
            return Ok(users);
        }
    }
}

fn is_no_user_matches(body: &str) -> bool {
    serde_json::from_str::<TwitterErrorBody>(body)
        .map(|b| b.errors.iter().any(|e| e.code == NO_USER_MATCHES))
        .unwrap_or(false)
}

/// How long to sleep before the rate-limit window resets, from the
/// `x-rate-limit-reset` header (epoch seconds). Defaults to one minute.
fn rate_limit_wait(headers: &reqwest::header::HeaderMap) -> Duration {
    let reset = headers
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok());

    match reset {
        Some(reset) => {
            let secs = (reset - chrono::Utc::now().timestamp()).max(1) as u64;
            Duration::from_secs(secs).min(MAX_RATE_LIMIT_WAIT)
        }
        None => Duration::from_secs(60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn recognizes_no_user_matches_body() {
        let body = r#"{"errors":[{"code":17,"message":"No user matches for specified terms."}]}"#;
        assert!(is_no_user_matches(body));
        assert!(!is_no_user_matches(r#"{"errors":[{"code":32,"message":"Could not authenticate you."}]}"#));
        assert!(!is_no_user_matches("<html>gateway timeout</html>"));
    }

    #[test]
    fn rate_limit_wait_defaults_without_header() {
        assert_eq!(rate_limit_wait(&HeaderMap::new()), Duration::from_secs(60));
    }

    #[test]
    fn rate_limit_wait_is_capped() {
        let mut headers = HeaderMap::new();
        let far_future = chrono::Utc::now().timestamp() + 24 * 3600;
        headers.insert(
            "x-rate-limit-reset",
            HeaderValue::from_str(&far_future.to_string()).unwrap(),
        );
        assert_eq!(rate_limit_wait(&headers), MAX_RATE_LIMIT_WAIT);
    }

    #[test]
    fn rate_limit_wait_in_the_past_is_one_second() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-reset", HeaderValue::from_static("1000"));
        assert_eq!(rate_limit_wait(&headers), Duration::from_secs(1));
    }
}
