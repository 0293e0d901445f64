use rusqlite::{params, OptionalExtension, TransactionBehavior};

use murmur_types::{DeletedPost, DeletedUser};

use crate::db::repositories::post_repository::archive_post;
use crate::db::repositories::{post_exists, user_exists};
use crate::db::{rows, DbPool};
use crate::error::{SocialError, SocialResult};

/// Soft-delete, recovery and purge of users and posts
///
/// Each operation is one transaction: a failure part-way through leaves the
/// live and archive tables exactly as they were.
pub struct ModerationRepository {
    pool: DbPool,
}

impl ModerationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Archive a user and all of their posts, then remove every trace of them
    /// from the live tables. Returns the number of posts archived.
    ///
    /// Follow edges, messages, and conversations in either direction are
    /// deleted outright; likes and replies by the user go with the user row.
    pub fn delete_user(&self, username: &str) -> SocialResult<usize> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let account: Option<(String, String)> = tx
            .query_row(
                "SELECT password, joined_at FROM users WHERE username = ?",
                [username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (password, joined_at) =
            account.ok_or_else(|| SocialError::not_found(format!("user '{}'", username)))?;

        let archived_posts = tx.execute(
            "INSERT INTO recently_deleted_posts (id, username, content, created_at)
             SELECT id, username, content, created_at FROM posts WHERE username = ?",
            [username],
        )?;

        tx.execute("DELETE FROM follows WHERE follower_username = ?", [username])?;
        tx.execute("DELETE FROM follows WHERE following_username = ?", [username])?;
        tx.execute("DELETE FROM posts WHERE username = ?", [username])?;
        tx.execute(
            "DELETE FROM conversations WHERE user1_username = ?1 OR user2_username = ?1",
            [username],
        )?;
        tx.execute(
            "DELETE FROM direct_messages WHERE sender_username = ?1 OR receiver_username = ?1",
            [username],
        )?;
        tx.execute("DELETE FROM users WHERE username = ?", [username])?;

        tx.execute(
            "INSERT INTO recently_deleted_users (username, password, joined_at) VALUES (?, ?, ?)",
            params![username, password, joined_at],
        )?;

        tx.commit()?;
        Ok(archived_posts)
    }

    /// Archive and remove a post without an ownership check
    pub fn delete_post(&self, post_id: i64) -> SocialResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !post_exists(&tx, post_id)? {
            return Err(SocialError::not_found(format!("post {}", post_id)));
        }
        archive_post(&tx, post_id)?;

        tx.commit()?;
        Ok(())
    }

    /// Archived users, most recently deleted first
    pub fn list_deleted_users(&self) -> SocialResult<Vec<DeletedUser>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT username, joined_at, deleted_at
             FROM recently_deleted_users
             ORDER BY deleted_at DESC, username",
        )?;
        let users = stmt
            .query_map([], rows::deleted_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Archived posts, most recently deleted first
    pub fn list_deleted_posts(&self) -> SocialResult<Vec<DeletedPost>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, content, created_at, deleted_at
             FROM recently_deleted_posts
             ORDER BY deleted_at DESC, id DESC",
        )?;
        let posts = stmt
            .query_map([], rows::deleted_post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Restore an archived user together with all of their archived posts,
    /// keeping original ids and timestamps. Returns the number of posts
    /// restored. Follows, likes and messages are not part of the archive and
    /// stay lost.
    pub fn recover_user(&self, username: &str) -> SocialResult<usize> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let archived: Option<(String, String)> = tx
            .query_row(
                "SELECT password, joined_at FROM recently_deleted_users WHERE username = ?",
                [username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (password, joined_at) = archived.ok_or_else(|| {
            SocialError::not_found(format!("user '{}' in deleted users", username))
        })?;

        if user_exists(&tx, username)? {
            return Err(SocialError::DuplicateUsername(username.to_string()));
        }

        tx.execute(
            "INSERT INTO users (username, password, joined_at) VALUES (?, ?, ?)",
            params![username, password, joined_at],
        )?;
        let restored_posts = tx.execute(
            "INSERT INTO posts (id, username, content, created_at)
             SELECT id, username, content, created_at
             FROM recently_deleted_posts
             WHERE username = ?",
            [username],
        )?;

        tx.execute("DELETE FROM recently_deleted_users WHERE username = ?", [username])?;
        tx.execute("DELETE FROM recently_deleted_posts WHERE username = ?", [username])?;

        tx.commit()?;
        Ok(restored_posts)
    }

    /// Restore a single archived post under its original id
    pub fn recover_post(&self, post_id: i64) -> SocialResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let author: Option<String> = tx
            .query_row(
                "SELECT username FROM recently_deleted_posts WHERE id = ?",
                [post_id],
                |row| row.get(0),
            )
            .optional()?;
        let author = author
            .ok_or_else(|| SocialError::not_found(format!("post {} in deleted posts", post_id)))?;

        if !user_exists(&tx, &author)? {
            return Err(SocialError::Conflict(format!(
                "author '{}' of post {} is not an active user",
                author, post_id
            )));
        }

        tx.execute(
            "INSERT INTO posts (id, username, content, created_at)
             SELECT id, username, content, created_at
             FROM recently_deleted_posts
             WHERE id = ?",
            [post_id],
        )?;
        tx.execute("DELETE FROM recently_deleted_posts WHERE id = ?", [post_id])?;

        tx.commit()?;
        Ok(())
    }

    /// Permanently remove an archived user. Returns whether an entry existed.
    pub fn purge_user(&self, username: &str) -> SocialResult<bool> {
        let conn = self.pool.get()?;
        let removed = conn.execute(
            "DELETE FROM recently_deleted_users WHERE username = ?",
            [username],
        )?;
        Ok(removed > 0)
    }

    /// Permanently remove an archived post. Returns whether an entry existed.
    pub fn purge_post(&self, post_id: i64) -> SocialResult<bool> {
        let conn = self.pool.get()?;
        let removed = conn.execute("DELETE FROM recently_deleted_posts WHERE id = ?", [post_id])?;
        Ok(removed > 0)
    }
}
