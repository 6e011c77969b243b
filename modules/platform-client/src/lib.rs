pub mod error;
pub mod facebook;
pub mod twitter;
pub mod types;

pub use error::{PlatformError, Result};
pub use facebook::{
    parse_bad_identifiers, FacebookClient, GRAPH_IDS_LIMIT, PAGE_DETAIL_FIELDS,
    REASON_ALIAS_MISSING, REASON_USERNAME_QUERY,
};
pub use twitter::{TwitterClient, TWITTER_LOOKUP_LIMIT};
pub use types::{Feed, FeedPost, GraphObject, PageDetails, TweetStatus, TwitterUser};
