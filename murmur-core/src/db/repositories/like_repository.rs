use rusqlite::{params, TransactionBehavior};

use crate::db::repositories::{post_exists, user_exists};
use crate::db::DbPool;
use crate::error::{SocialError, SocialResult};

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Like a post. Returns true when a row was added, false when the user had
    /// already liked it.
    pub fn like(&self, post_id: i64, username: &str) -> SocialResult<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !post_exists(&tx, post_id)? {
            return Err(SocialError::not_found(format!("post {}", post_id)));
        }
        if !user_exists(&tx, username)? {
            return Err(SocialError::not_found(format!("user '{}'", username)));
        }

        let inserted = tx.execute(
            "INSERT INTO likes (post_id, username) VALUES (?, ?)
             ON CONFLICT (post_id, username) DO NOTHING",
            params![post_id, username],
        )?;

        tx.commit()?;
        Ok(inserted > 0)
    }

    /// Remove a like; succeeds whether or not one existed
    pub fn unlike(&self, post_id: i64, username: &str) -> SocialResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "DELETE FROM likes WHERE post_id = ? AND username = ?",
            params![post_id, username],
        )?;
        Ok(())
    }

    pub fn is_liked(&self, post_id: i64, username: &str) -> SocialResult<bool> {
        let conn = self.pool.get()?;
        let liked: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE post_id = ? AND username = ?)",
            params![post_id, username],
            |row| row.get(0),
        )?;
        Ok(liked)
    }

    pub fn count(&self, post_id: i64) -> SocialResult<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?",
            [post_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
