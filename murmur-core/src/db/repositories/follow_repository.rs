use rusqlite::TransactionBehavior;

use crate::db::repositories::user_exists;
use crate::db::DbPool;
use crate::error::{SocialError, SocialResult};

pub struct FollowRepository {
    pool: DbPool,
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Check if `follower` is following `following`
    pub fn is_following(&self, follower: &str, following: &str) -> SocialResult<bool> {
        let conn = self.pool.get()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_username = ? AND following_username = ?)",
            [follower, following],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Follow a user. Returns true if a new edge was created, false if it
    /// already existed.
    pub fn follow(&self, follower: &str, following: &str) -> SocialResult<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for username in [follower, following] {
            if !user_exists(&tx, username)? {
                return Err(SocialError::not_found(format!("user '{}'", username)));
            }
        }

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO follows (follower_username, following_username) VALUES (?, ?)",
            [follower, following],
        )?;

        tx.commit()?;
        Ok(inserted > 0)
    }

    /// Unfollow a user. Returns true if an edge was removed.
    pub fn unfollow(&self, follower: &str, following: &str) -> SocialResult<bool> {
        let conn = self.pool.get()?;
        let removed = conn.execute(
            "DELETE FROM follows WHERE follower_username = ? AND following_username = ?",
            [follower, following],
        )?;
        Ok(removed > 0)
    }

    /// Users that `username` follows, most recent first
    pub fn get_following(&self, username: &str) -> SocialResult<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT following_username FROM follows
             WHERE follower_username = ?
             ORDER BY created_at DESC, following_username",
        )?;
        let following = stmt
            .query_map([username], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(following)
    }

    /// Users that follow `username`, most recent first
    pub fn get_followers(&self, username: &str) -> SocialResult<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT follower_username FROM follows
             WHERE following_username = ?
             ORDER BY created_at DESC, follower_username",
        )?;
        let followers = stmt
            .query_map([username], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(followers)
    }
}
