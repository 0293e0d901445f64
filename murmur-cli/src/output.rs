use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use murmur_core::snapshot::SnapshotSummary;
use murmur_types::{
    ConversationSummary, DeletedPost, DeletedUser, DirectMessage, FeedItem, Post, Reply, User,
    UserProfile,
};

/// Print `value` as pretty JSON when requested, otherwise hand it to `human`
pub fn emit<T: Serialize + ?Sized>(json: bool, value: &T, human: impl FnOnce(&T)) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(value).context("Failed to encode output")?;
        println!("{}", rendered);
    } else {
        human(value);
    }
    Ok(())
}

fn when(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

pub fn post_line(post: &Post) -> String {
    format!(
        "#{} @{} ({}): {}",
        post.id,
        post.username,
        when(&post.created_at),
        post.content
    )
}

pub fn print_posts(posts: &[Post]) {
    if posts.is_empty() {
        println!("No posts.");
    }
    for post in posts {
        println!("{}", post_line(post));
    }
}

pub fn reply_line(reply: &Reply) -> String {
    let quoting = match (reply.parent_reply_id, reply.parent_username.as_str()) {
        (Some(_), "") => " (replying to a deleted reply)".to_string(),
        (Some(_), parent) => format!(" (replying to @{})", parent),
        (None, _) => String::new(),
    };
    format!(
        "  ↳ [{}] @{}{}: {}",
        reply.id, reply.username, quoting, reply.content
    )
}

pub fn print_replies(replies: &[Reply]) {
    if replies.is_empty() {
        println!("No replies.");
    }
    for reply in replies {
        println!("{}", reply_line(reply));
    }
}

pub fn print_feed(items: &[FeedItem]) {
    if items.is_empty() {
        println!("Nothing to show yet.");
    }
    for item in items {
        let liked = if item.liked_by_viewer { " (liked)" } else { "" };
        let following = if item.viewer_follows_author { " [following]" } else { "" };
        println!("{}{}", post_line(&item.post), following);
        println!("  {} likes{}, {} replies", item.like_count, liked, item.replies.len());
        for reply in &item.replies {
            println!("{}", reply_line(reply));
        }
        println!();
    }
}

pub fn print_profile(profile: &UserProfile) {
    println!("@{}", profile.username);
    println!(
        "{} followers, {} following{}",
        profile.follower_count,
        profile.following_count,
        if profile.viewer_follows { " (you follow them)" } else { "" }
    );
    if !profile.followers.is_empty() {
        println!("Followers: {}", profile.followers.join(", "));
    }
    if !profile.following.is_empty() {
        println!("Following: {}", profile.following.join(", "));
    }
    println!();
    print_posts(&profile.posts);
}

/// Inbox listing with the viewer's total unread count
#[derive(Debug, Serialize)]
pub struct InboxView {
    pub unread: i64,
    pub conversations: Vec<ConversationSummary>,
}

pub fn print_inbox(inbox: &InboxView) {
    if inbox.unread > 0 {
        println!("{} unread", inbox.unread);
    }
    if inbox.conversations.is_empty() {
        println!("No conversations.");
    }
    for conversation in &inbox.conversations {
        let unread = if conversation.unread_count > 0 {
            format!(" [{} unread]", conversation.unread_count)
        } else {
            String::new()
        };
        println!(
            "@{} ({}){}: {}",
            conversation.other_user,
            when(&conversation.last_message_at),
            unread,
            conversation.last_message
        );
    }
}

pub fn print_thread(messages: &[DirectMessage]) {
    if messages.is_empty() {
        println!("No messages.");
    }
    for message in messages {
        println!(
            "[{}] @{} -> @{}: {}",
            when(&message.created_at),
            message.sender,
            message.receiver,
            message.content
        );
    }
}

pub fn print_users(users: &[User]) {
    for user in users {
        println!("@{} (joined {})", user.username, when(&user.joined_at));
    }
    println!("{} users", users.len());
}

pub fn print_deleted_users(users: &[DeletedUser]) {
    if users.is_empty() {
        println!("No deleted users.");
    }
    for user in users {
        println!(
            "@{} (joined {}, deleted {})",
            user.username,
            when(&user.joined_at),
            when(&user.deleted_at)
        );
    }
}

pub fn print_deleted_posts(posts: &[DeletedPost]) {
    if posts.is_empty() {
        println!("No deleted posts.");
    }
    for post in posts {
        println!(
            "#{} @{} (deleted {}): {}",
            post.id,
            post.username,
            when(&post.deleted_at),
            post.content
        );
    }
}

pub fn print_snapshot(summary: &SnapshotSummary) {
    println!("Snapshot {} written to {}", summary.export_id, summary.destination);
    for (table, rows) in &summary.rows_per_table {
        println!("  {:<24} {}", table, rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reply(parent_reply_id: Option<i64>, parent_username: &str) -> Reply {
        Reply {
            id: 2,
            post_id: 1,
            username: "dave".to_string(),
            content: "agreed".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 7, 10, 0, 0).unwrap(),
            parent_reply_id,
            parent_username: parent_username.to_string(),
        }
    }

    #[test]
    fn test_reply_line_shows_parent() {
        assert!(reply_line(&reply(Some(1), "carol")).contains("replying to @carol"));
        assert!(reply_line(&reply(Some(1), "")).contains("deleted reply"));
        assert!(!reply_line(&reply(None, "")).contains("replying"));
    }

    #[test]
    fn test_post_line() {
        let post = Post {
            id: 3,
            username: "alice".to_string(),
            content: "hello".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 7, 10, 30, 0).unwrap(),
        };
        assert_eq!(post_line(&post), "#3 @alice (2024-01-07 10:30): hello");
    }
}
