use anyhow::Context;

use murmur_types::{ConversationSummary, DirectMessage, Identity, Post, Reply, User};

use crate::auth::Authenticator;
use crate::config::{AdminCredentials, Settings};
use crate::db::repositories::{
    DirectMessageRepository, FollowRepository, LikeRepository, ModerationRepository,
    PostRepository, ReplyRepository, UserRepository,
};
use crate::db::Database;
use crate::error::{SocialError, SocialResult};
use crate::moderation::AdminConsole;

/// Caller interface to the social graph
///
/// Writes return `SocialResult`. Reads return plain values and fall back to
/// an empty/false/zero answer when storage fails, logging a warning.
pub struct SocialService {
    db: Database,
    auth: Authenticator,
    pub(crate) users: UserRepository,
    pub(crate) posts: PostRepository,
    pub(crate) follows: FollowRepository,
    pub(crate) likes: LikeRepository,
    pub(crate) replies: ReplyRepository,
    pub(crate) messages: DirectMessageRepository,
    pub(crate) moderation: ModerationRepository,
}

/// Unwrap a read result, degrading to the type's default on failure
fn degrade<T: Default>(operation: &str, result: SocialResult<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!("{} failed, returning empty result: {}", operation, e);
        T::default()
    })
}

fn require_content(content: &str, what: &str) -> SocialResult<()> {
    if content.trim().is_empty() {
        return Err(SocialError::validation(format!("{} cannot be empty", what)));
    }
    Ok(())
}

impl SocialService {
    /// Open the configured database, apply the schema, and build the service
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db = Database::new(&settings.database.path)
            .with_context(|| format!("Failed to open database at {}", settings.database.path))?;
        db.initialize()?;
        tracing::info!("Database ready at {}", settings.database.path);
        Ok(Self::with_database(db, settings.admin.clone()))
    }

    /// Build the service over an already initialized database
    pub fn with_database(db: Database, admin: Option<AdminCredentials>) -> Self {
        let pool = db.pool.clone();
        Self {
            auth: Authenticator::new(UserRepository::new(pool.clone()), admin),
            users: UserRepository::new(pool.clone()),
            posts: PostRepository::new(pool.clone()),
            follows: FollowRepository::new(pool.clone()),
            likes: LikeRepository::new(pool.clone()),
            replies: ReplyRepository::new(pool.clone()),
            messages: DirectMessageRepository::new(pool.clone()),
            moderation: ModerationRepository::new(pool),
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // Accounts

    /// Create an account. Surrounding whitespace on either field is dropped
    /// before validation, so `" alice "` registers as `alice`.
    pub fn register(&self, username: &str, password: &str) -> SocialResult<User> {
        let (username, password) = (username.trim(), password.trim());
        if username.is_empty() {
            return Err(SocialError::validation("username cannot be empty"));
        }
        if password.is_empty() {
            return Err(SocialError::validation("password cannot be empty"));
        }
        if self.auth.is_admin_name(username) {
            return Err(SocialError::DuplicateUsername(username.to_string()));
        }

        let user = self.users.create(username, password)?;
        tracing::info!("Registered user {}", user.username);
        Ok(user)
    }

    pub fn authenticate(&self, username: &str, password: &str) -> SocialResult<Identity> {
        self.auth.authenticate(username, password)
    }

    /// Open the moderation console for the configured administrator
    pub fn admin_console(&self, identity: &Identity) -> SocialResult<AdminConsole<'_>> {
        if let Err(e) = self.auth.authorize_admin(identity) {
            tracing::warn!("{} was refused the admin console: {}", identity.username, e);
            return Err(e);
        }
        Ok(AdminConsole::new(self, identity.clone()))
    }

    // Posts

    pub fn create_post(&self, username: &str, content: &str) -> SocialResult<Post> {
        require_content(content, "post content")?;
        let post = self.posts.create(username, content)?;
        tracing::info!("User {} created post {}", username, post.id);
        Ok(post)
    }

    pub fn list_all_posts(&self) -> Vec<Post> {
        degrade("list_all_posts", self.posts.list_all())
    }

    pub fn list_followed_posts(&self, username: &str) -> Vec<Post> {
        degrade("list_followed_posts", self.posts.list_followed(username))
    }

    pub fn list_posts_by(&self, username: &str) -> Vec<Post> {
        degrade("list_posts_by", self.posts.list_by_author(username))
    }

    pub fn delete_post(&self, post_id: i64, requester: &str) -> SocialResult<()> {
        self.posts.delete_owned(post_id, requester)?;
        tracing::info!("User {} deleted post {}", requester, post_id);
        Ok(())
    }

    // Social graph

    pub fn follow(&self, follower: &str, followee: &str) -> SocialResult<bool> {
        if follower == followee {
            return Err(SocialError::validation("users cannot follow themselves"));
        }
        let created = self.follows.follow(follower, followee)?;
        if created {
            tracing::info!("{} followed {}", follower, followee);
        } else {
            tracing::debug!("{} already follows {}", follower, followee);
        }
        Ok(created)
    }

    pub fn unfollow(&self, follower: &str, followee: &str) -> SocialResult<bool> {
        let removed = self.follows.unfollow(follower, followee)?;
        if removed {
            tracing::info!("{} unfollowed {}", follower, followee);
        } else {
            tracing::debug!("{} was not following {}", follower, followee);
        }
        Ok(removed)
    }

    pub fn is_following(&self, follower: &str, followee: &str) -> bool {
        degrade("is_following", self.follows.is_following(follower, followee))
    }

    pub fn list_followers(&self, username: &str) -> Vec<String> {
        degrade("list_followers", self.follows.get_followers(username))
    }

    pub fn list_following(&self, username: &str) -> Vec<String> {
        degrade("list_following", self.follows.get_following(username))
    }

    // Engagement

    pub fn like(&self, post_id: i64, username: &str) -> SocialResult<bool> {
        let liked = self.likes.like(post_id, username)?;
        if !liked {
            tracing::debug!("{} already liked post {}", username, post_id);
        }
        Ok(liked)
    }

    pub fn unlike(&self, post_id: i64, username: &str) -> SocialResult<()> {
        self.likes.unlike(post_id, username)
    }

    pub fn like_count(&self, post_id: i64) -> i64 {
        degrade("like_count", self.likes.count(post_id))
    }

    pub fn is_liked(&self, post_id: i64, username: &str) -> bool {
        degrade("is_liked", self.likes.is_liked(post_id, username))
    }

    pub fn add_reply(
        &self,
        post_id: i64,
        username: &str,
        content: &str,
        parent_reply_id: Option<i64>,
    ) -> SocialResult<Reply> {
        require_content(content, "reply content")?;
        let reply = self.replies.add(post_id, username, content, parent_reply_id)?;
        tracing::info!("User {} replied to post {}", username, post_id);
        Ok(reply)
    }

    pub fn list_replies(&self, post_id: i64) -> Vec<Reply> {
        degrade("list_replies", self.replies.list(post_id))
    }

    pub fn delete_reply(&self, reply_id: i64, requester: &str) -> SocialResult<()> {
        self.replies.delete_owned(reply_id, requester)?;
        tracing::info!("User {} deleted reply {}", requester, reply_id);
        Ok(())
    }

    // Messaging

    pub fn send_message(
        &self,
        sender: &str,
        receiver: &str,
        content: &str,
    ) -> SocialResult<DirectMessage> {
        require_content(content, "message content")?;
        let message = self.messages.send(sender, receiver, content)?;
        tracing::info!("{} sent message {} to {}", sender, message.id, receiver);
        Ok(message)
    }

    pub fn list_conversation(&self, user_a: &str, user_b: &str) -> Vec<DirectMessage> {
        degrade("list_conversation", self.messages.get_conversation(user_a, user_b))
    }

    pub fn list_conversations_for(&self, username: &str) -> Vec<ConversationSummary> {
        degrade("list_conversations_for", self.messages.get_conversations_for(username))
    }

    pub fn mark_conversation_read(&self, reader: &str, other: &str) -> SocialResult<usize> {
        self.messages.mark_as_read(reader, other)
    }

    pub fn unread_count(&self, username: &str) -> i64 {
        degrade("unread_count", self.messages.get_unread_count(username))
    }
}
