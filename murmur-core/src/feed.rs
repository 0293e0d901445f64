//! Feed and profile assembly
//!
//! Views that combine several data access calls into what a client renders:
//! decorated feed items, user profiles, the inbox, and message threads.

use murmur_types::{ConversationSummary, DirectMessage, FeedItem, FeedScope, Post, UserProfile};

use crate::service::SocialService;

impl SocialService {
    /// Posts in scope, newest first, each decorated for `viewer`
    pub fn feed(&self, viewer: &str, scope: FeedScope) -> Vec<FeedItem> {
        tracing::debug!("Building {} feed for {}", scope.as_str(), viewer);
        let posts = match scope {
            FeedScope::Everyone => self.list_all_posts(),
            FeedScope::Following => self.list_followed_posts(viewer),
        };
        let following = self.list_following(viewer);

        posts
            .into_iter()
            .map(|post| self.decorate(post, viewer, &following))
            .collect()
    }

    fn decorate(&self, post: Post, viewer: &str, following: &[String]) -> FeedItem {
        FeedItem {
            like_count: self.like_count(post.id),
            liked_by_viewer: self.is_liked(post.id, viewer),
            viewer_follows_author: post.username != viewer
                && following.iter().any(|name| *name == post.username),
            replies: self.list_replies(post.id),
            post,
        }
    }

    /// Profile of `username` as seen by `viewer`; None when no such user
    pub fn profile(&self, viewer: &str, username: &str) -> Option<UserProfile> {
        match self.users.get_by_username(username) {
            Ok(Some(_)) => {}
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("profile lookup for {} failed: {}", username, e);
                return None;
            }
        }

        let followers = self.list_followers(username);
        let following = self.list_following(username);
        Some(UserProfile {
            username: username.to_string(),
            follower_count: followers.len(),
            following_count: following.len(),
            viewer_follows: viewer != username && followers.iter().any(|name| name == viewer),
            followers,
            following,
            posts: self.list_posts_by(username),
        })
    }

    /// Conversations of `username`, most recently active first
    pub fn inbox(&self, username: &str) -> Vec<ConversationSummary> {
        self.list_conversations_for(username)
    }

    /// Messages between `viewer` and `other`, marking the incoming ones read
    ///
    /// The returned messages reflect their state before marking.
    pub fn open_thread(&self, viewer: &str, other: &str) -> Vec<DirectMessage> {
        let messages = self.list_conversation(viewer, other);
        if messages.iter().any(|m| m.receiver == viewer && !m.is_read) {
            if let Err(e) = self.mark_conversation_read(viewer, other) {
                tracing::warn!("Failed to mark thread {} <- {} read: {}", viewer, other, e);
            }
        }
        messages
    }
}
