pub mod config;
pub mod error;

pub use config::{Config, SnapshotMode};
pub use error::SocialRegError;
