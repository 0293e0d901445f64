use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Timestamps travel as RFC3339 with millisecond precision, matching storage
mod datetime_format {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339_opts(SecondsFormat::Millis, true);
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// A registered account. The password never leaves the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(with = "datetime_format")]
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub username: String,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: i64,
    pub post_id: i64,
    pub username: String,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    /// Reply being quoted, if this is a threaded response
    #[serde(default)]
    pub parent_reply_id: Option<i64>,
    /// Author of the quoted reply; empty when there is none or it was deleted
    #[serde(default)]
    pub parent_username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// One inbox row: the latest exchange with a single correspondent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub other_user: String,
    pub last_message: String,
    #[serde(with = "datetime_format")]
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedUser {
    pub username: String,
    #[serde(with = "datetime_format")]
    pub joined_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedPost {
    pub id: i64,
    pub username: String,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub deleted_at: DateTime<Utc>,
}

/// A post as rendered in a feed, decorated from the viewer's perspective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub post: Post,
    pub like_count: i64,
    pub liked_by_viewer: bool,
    /// Always false for the viewer's own posts
    pub viewer_follows_author: bool,
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub follower_count: usize,
    pub following_count: usize,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub viewer_follows: bool,
    pub posts: Vec<Post>,
}
