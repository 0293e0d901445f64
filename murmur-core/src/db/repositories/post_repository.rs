use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use murmur_types::Post;

use crate::db::repositories::user_exists;
use crate::db::{rows, DbPool};
use crate::error::{SocialError, SocialResult};

pub struct PostRepository {
    pool: DbPool,
}

pub(crate) fn post_exists(conn: &Connection, post_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?)",
        [post_id],
        |row| row.get(0),
    )
}

/// Copy a live post into the archive with a deletion timestamp, then remove it.
/// Must run inside the caller's transaction. Returns the number of posts moved.
pub(crate) fn archive_post(conn: &Connection, post_id: i64) -> rusqlite::Result<usize> {
    let archived = conn.execute(
        "INSERT INTO recently_deleted_posts (id, username, content, created_at)
         SELECT id, username, content, created_at FROM posts WHERE id = ?",
        [post_id],
    )?;
    conn.execute("DELETE FROM posts WHERE id = ?", [post_id])?;
    Ok(archived)
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post; id and timestamp are assigned by the database
    pub fn create(&self, username: &str, content: &str) -> SocialResult<Post> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !user_exists(&tx, username)? {
            return Err(SocialError::not_found(format!("user '{}'", username)));
        }

        let post = tx.query_row(
            "INSERT INTO posts (username, content) VALUES (?, ?)
             RETURNING id, username, content, created_at",
            [username, content],
            rows::post,
        )?;

        tx.commit()?;
        Ok(post)
    }

    /// All live posts, newest first
    pub fn list_all(&self) -> SocialResult<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, content, created_at
             FROM posts
             ORDER BY created_at DESC, id DESC",
        )?;
        let posts = stmt
            .query_map([], rows::post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Posts written by accounts `username` follows, newest first
    pub fn list_followed(&self, username: &str) -> SocialResult<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, content, created_at
             FROM followed_posts
             WHERE viewer = ?
             ORDER BY created_at DESC, id DESC",
        )?;
        let posts = stmt
            .query_map([username], rows::post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Posts by a specific user, newest first
    pub fn list_by_author(&self, username: &str) -> SocialResult<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, content, created_at
             FROM posts
             WHERE username = ?
             ORDER BY created_at DESC, id DESC",
        )?;
        let posts = stmt
            .query_map([username], rows::post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Get a single post by ID
    pub fn get_by_id(&self, post_id: i64) -> SocialResult<Option<Post>> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                "SELECT id, username, content, created_at FROM posts WHERE id = ?",
                [post_id],
                rows::post,
            )
            .optional()?;
        Ok(post)
    }

    /// Soft-delete a post on behalf of its author
    ///
    /// The ownership read, the archive insert and the delete share one
    /// transaction, so a concurrent delete of the same post sees `NotFound`.
    pub fn delete_owned(&self, post_id: i64, requester: &str) -> SocialResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let owner: Option<String> = tx
            .query_row("SELECT username FROM posts WHERE id = ?", [post_id], |row| row.get(0))
            .optional()?;

        match owner {
            None => return Err(SocialError::not_found(format!("post {}", post_id))),
            Some(owner) if owner != requester => {
                return Err(SocialError::forbidden("you can only delete your own posts"));
            }
            Some(_) => {}
        }

        archive_post(&tx, post_id)?;
        tx.commit()?;
        Ok(())
    }
}
