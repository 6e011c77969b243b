use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::error::{PlatformError, Result};
use crate::types::GraphErrorBody;

pub const GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// The Graph API resolves at most this many ids per `?ids=` request.
pub const GRAPH_IDS_LIMIT: usize = 50;

/// Fields requested when looking pages up by id.
pub const PAGE_DETAIL_FIELDS: &str = "about,can_checkin,category,category_list,checkins,\
contact_address,cover,description,display_subtext,displayed_message_response_time,emails,\
fan_count,featured_video,general_info,hours,is_always_open,is_community_page,\
is_eligible_for_branded_content,is_permanently_closed,is_unclaimed,is_verified,link,location,\
mission,name,name_with_location_descriptor,overall_star_rating,parent_page,phone,rating_count,\
talking_about_count,username,website,verification_status,\
feed.limit(1){created_time,story,status_type,id,permalink_url}";

pub const REASON_USERNAME_QUERY: &str = "cannot query user by their username";
pub const REASON_ALIAS_MISSING: &str = "the alias you requested does not exist";

pub struct FacebookClient {
    client: reqwest::Client,
    base_url: String,
    version: String,
    access_token: String,
}

impl FacebookClient {
    pub fn new(access_token: String, version: impl Into<String>) -> Self {
        Self::with_base_url(GRAPH_BASE_URL, access_token, version)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        access_token: String,
        version: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            version: version.into(),
            access_token,
        }
    }

    /// Resolve a batch of ids (page ids, usernames or profile URLs) in one
    /// request. The response is keyed by the identifiers as requested.
    ///
    /// When the batch contains identifiers the Graph API rejects, the whole
    /// request fails with [`PlatformError::BadIdentifiers`] naming them.
    pub async fn get_objects<T: DeserializeOwned>(
        &self,
        ids: &[String],
        fields: Option<&str>,
    ) -> Result<HashMap<String, T>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/v{}/", self.base_url, self.version);
        let joined = ids.join(",");
        let mut query = vec![
            ("ids", joined.as_str()),
            ("access_token", self.access_token.as_str()),
        ];
        if let Some(fields) = fields {
            query.push(("fields", fields));
        }

        let resp = self.client.get(&url).query(&query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_graph_error(status.as_u16(), body));
        }

        let objects: HashMap<String, T> = resp.json().await?;
        Ok(objects)
    }
}

fn classify_graph_error(status: u16, body: String) -> PlatformError {
    let message = serde_json::from_str::<GraphErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);

    match parse_bad_identifiers(&message) {
        Some((reason, identifiers)) => PlatformError::BadIdentifiers {
            reason: reason.to_string(),
            identifiers,
        },
        None => PlatformError::Api { status, message },
    }
}

/// Pull the offending identifiers out of a Graph API error message.
///
/// Two shapes are known:
/// `(#100) Cannot query users by their username (a,b)` and
/// `(#803) Some of the aliases you requested do not exist: a,b`.
pub fn parse_bad_identifiers(message: &str) -> Option<(&'static str, Vec<String>)> {
    let (reason, list) = if message.contains("Cannot query users by their username") {
        let open = message.rfind('(')?;
        let close = message.rfind(')')?;
        if close <= open {
            return None;
        }
        (REASON_USERNAME_QUERY, &message[open + 1..close])
    } else if message.contains("Some of the aliases you requested do not exist") {
        let start = message.rfind("exist:")? + "exist:".len();
        (REASON_ALIAS_MISSING, &message[start..])
    } else {
        return None;
    };

    let identifiers: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    if identifiers.is_empty() {
        None
    } else {
        Some((reason, identifiers))
    }
}
