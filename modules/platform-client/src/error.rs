use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlatformError>;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    /// The batch contained identifiers the platform refuses to resolve.
    /// Retrying the batch without `identifiers` is expected to succeed.
    #[error("{reason}: {}", identifiers.join(","))]
    BadIdentifiers {
        reason: String,
        identifiers: Vec<String>,
    },

    #[error("Rate limit still exhausted after {0} waits")]
    RateLimited(u32),
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PlatformError::Parse(err.to_string())
        } else {
            PlatformError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        PlatformError::Parse(err.to_string())
    }
}
