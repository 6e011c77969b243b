use thiserror::Error;

#[derive(Error, Debug)]
pub enum SocialRegError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: {0} is required when fetching")]
    MissingCredential(&'static str),
}
