use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub image_url: String,
    pub published_at: String,
}

impl BlogPost {
    /// `None` when `published_at` is not an RFC 3339 timestamp.
    pub fn published_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.published_at)
            .ok()
            .map(|timestamp| timestamp.with_timezone(&Utc))
    }
}

/// Fields supplied by the admin surface. Emptiness is checked by the caller,
/// not by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub image_url: String,
}
