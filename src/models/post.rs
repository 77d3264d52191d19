//! Raw fragment and validated post structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw, unvalidated post as captured from the browser layer.
///
/// Every sub-field is optional and the count fields are display strings
/// ("1,234", "1.2K"); nothing here is trusted until it passes through
/// [`crate::services::normalize`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFragment {
    /// Post body text
    #[serde(default)]
    pub text: Option<String>,

    /// Author display handle
    #[serde(default)]
    pub author: Option<String>,

    /// ISO-8601 timestamp as found in the DOM
    #[serde(default)]
    pub timestamp: Option<String>,

    /// Like count display string
    #[serde(default)]
    pub likes: Option<String>,

    /// Retweet count display string
    #[serde(default)]
    pub retweets: Option<String>,

    /// Reply count display string
    #[serde(default)]
    pub replies: Option<String>,
}

/// A validated post ready for classification and scoring.
///
/// Immutable once constructed; all counts are non-negative by type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Post body text (non-empty)
    pub text: String,

    /// Author display handle
    pub author: String,

    /// Post timestamp
    pub timestamp: DateTime<Utc>,

    /// Like count
    pub likes: u64,

    /// Retweet count
    pub retweets: u64,

    /// Reply count
    pub replies: u64,
}
