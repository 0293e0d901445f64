use serde::{Deserialize, Serialize};

/// Privilege level attached to an authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Regular,
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Administrator => "administrator",
        }
    }
}

/// Which posts a feed is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FeedScope {
    /// Every live post
    #[default]
    Everyone,
    /// Only posts by accounts the viewer follows
    Following,
}

impl FeedScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedScope::Everyone => "Everyone",
            FeedScope::Following => "Following",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Everyone" | "everyone" | "all" => Some(FeedScope::Everyone),
            "Following" | "following" => Some(FeedScope::Following),
            _ => None,
        }
    }
}
