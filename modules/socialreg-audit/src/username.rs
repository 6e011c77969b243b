// Username extraction: free-text registry URLs → normalized platform handles.

use std::sync::LazyLock;

use regex::Regex;

use crate::platforms::Platform;

static TWITTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?[tT]witter\.com/(?:#!/)?@?([^/?\s]*)")
        .expect("valid regex")
});

/// Intermediate `segment/` components are skipped, so the last path segment
/// wins: `facebook.com/PageName/about` yields `about`.
static FACEBOOK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?[fF]acebook\.com/(?:.+/)*([\w.\-]+)")
        .expect("valid regex")
});

/// Extract the lower-cased handle from a profile URL.
///
/// URLs that do not mention the platform's domain are rejected before any
/// pattern matching. Empty captures (`twitter.com/`) count as no handle.
pub fn extract(url: &str, platform: Platform) -> Option<String> {
    if !url.to_lowercase().contains(platform.domain()) {
        return None;
    }

    let re = match platform {
        Platform::Twitter => &*TWITTER_RE,
        Platform::Facebook => &*FACEBOOK_RE,
    };

    let handle = re.captures(url)?.get(1)?.as_str();
    if handle.is_empty() {
        return None;
    }
    Some(handle.to_lowercase())
}

/// Canonical profile URL for a handle. Facebook lookups are addressed by
/// this URL rather than by handle.
pub fn profile_url(handle: &str, platform: Platform) -> String {
    format!("https://www.{}/{}", platform.domain(), handle)
}
