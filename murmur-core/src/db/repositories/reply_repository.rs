use rusqlite::{params, OptionalExtension, TransactionBehavior};

use murmur_types::Reply;

use crate::db::repositories::{post_exists, user_exists};
use crate::db::{rows, DbPool};
use crate::error::{SocialError, SocialResult};

/// Replies joined back onto themselves to resolve the quoted author
const REPLY_SELECT: &str = "SELECT r.id, r.post_id, r.username, r.content, r.created_at,
        r.parent_reply_id, COALESCE(p.username, '') AS parent_username
     FROM replies r
     LEFT JOIN replies p ON r.parent_reply_id = p.id";

pub struct ReplyRepository {
    pool: DbPool,
}

impl ReplyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Add a reply to a post, optionally quoting another reply on the same post
    pub fn add(
        &self,
        post_id: i64,
        username: &str,
        content: &str,
        parent_reply_id: Option<i64>,
    ) -> SocialResult<Reply> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !post_exists(&tx, post_id)? {
            return Err(SocialError::not_found(format!("post {}", post_id)));
        }
        if !user_exists(&tx, username)? {
            return Err(SocialError::not_found(format!("user '{}'", username)));
        }

        if let Some(parent_id) = parent_reply_id {
            let parent_post: Option<i64> = tx
                .query_row("SELECT post_id FROM replies WHERE id = ?", [parent_id], |row| {
                    row.get(0)
                })
                .optional()?;
            match parent_post {
                None => {
                    return Err(SocialError::validation(format!(
                        "parent reply {} does not exist",
                        parent_id
                    )))
                }
                Some(parent_post) if parent_post != post_id => {
                    return Err(SocialError::validation(format!(
                        "parent reply {} belongs to another post",
                        parent_id
                    )))
                }
                Some(_) => {}
            }
        }

        let reply_id: i64 = tx.query_row(
            "INSERT INTO replies (post_id, username, content, parent_reply_id)
             VALUES (?, ?, ?, ?)
             RETURNING id",
            params![post_id, username, content, parent_reply_id],
            |row| row.get(0),
        )?;
        let reply = tx.query_row(
            &format!("{} WHERE r.id = ?", REPLY_SELECT),
            [reply_id],
            rows::reply,
        )?;

        tx.commit()?;
        Ok(reply)
    }

    /// Replies on a post in creation order, with parent authors resolved
    pub fn list(&self, post_id: i64) -> SocialResult<Vec<Reply>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE r.post_id = ? ORDER BY r.created_at ASC, r.id ASC",
            REPLY_SELECT
        ))?;
        let replies = stmt
            .query_map([post_id], rows::reply)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(replies)
    }

    pub fn get_by_id(&self, reply_id: i64) -> SocialResult<Option<Reply>> {
        let conn = self.pool.get()?;
        let reply = conn
            .query_row(
                &format!("{} WHERE r.id = ?", REPLY_SELECT),
                [reply_id],
                rows::reply,
            )
            .optional()?;
        Ok(reply)
    }

    /// Hard-delete a reply on behalf of its author. Replies quoting it are
    /// left in place with a dangling parent.
    pub fn delete_owned(&self, reply_id: i64, requester: &str) -> SocialResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let owner: Option<String> = tx
            .query_row("SELECT username FROM replies WHERE id = ?", [reply_id], |row| {
                row.get(0)
            })
            .optional()?;

        match owner {
            None => return Err(SocialError::not_found(format!("reply {}", reply_id))),
            Some(owner) if owner != requester => {
                return Err(SocialError::forbidden("you can only delete your own replies"));
            }
            Some(_) => {}
        }

        tx.execute("DELETE FROM replies WHERE id = ?", [reply_id])?;
        tx.commit()?;
        Ok(())
    }
}
