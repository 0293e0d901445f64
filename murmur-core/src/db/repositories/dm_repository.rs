use rusqlite::TransactionBehavior;

use murmur_types::{ConversationSummary, DirectMessage};

use crate::db::repositories::user_exists;
use crate::db::{rows, DbPool};
use crate::error::{SocialError, SocialResult};

pub struct DirectMessageRepository {
    pool: DbPool,
}

impl DirectMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Persist a direct message. The insert trigger creates or refreshes the
    /// conversation row for the pair within the same statement.
    pub fn send(&self, sender: &str, receiver: &str, content: &str) -> SocialResult<DirectMessage> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for username in [sender, receiver] {
            if !user_exists(&tx, username)? {
                return Err(SocialError::not_found(format!("user '{}'", username)));
            }
        }

        let message = tx.query_row(
            "INSERT INTO direct_messages (sender_username, receiver_username, content)
             VALUES (?, ?, ?)
             RETURNING id, sender_username, receiver_username, content, created_at, is_read",
            [sender, receiver, content],
            rows::direct_message,
        )?;

        tx.commit()?;
        Ok(message)
    }

    /// Full history between two users in chronological order
    pub fn get_conversation(&self, user_a: &str, user_b: &str) -> SocialResult<Vec<DirectMessage>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, sender_username, receiver_username, content, created_at, is_read
             FROM direct_messages
             WHERE (sender_username = ?1 AND receiver_username = ?2)
                OR (sender_username = ?2 AND receiver_username = ?1)
             ORDER BY created_at ASC, id ASC",
        )?;
        let messages = stmt
            .query_map([user_a, user_b], rows::direct_message)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    /// Inbox rows for `username`, most recently active conversation first
    pub fn get_conversations_for(&self, username: &str) -> SocialResult<Vec<ConversationSummary>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT other_user, COALESCE(last_message, ''), last_message_at, unread_count
             FROM conversation_summaries
             WHERE owner = ?
             ORDER BY last_message_at DESC, other_user",
        )?;
        let summaries = stmt
            .query_map([username], |row| {
                Ok(ConversationSummary {
                    other_user: row.get(0)?,
                    last_message: row.get(1)?,
                    last_message_at: rows::timestamp(row, 2)?,
                    unread_count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    /// Mark every message from `other` to `reader` as read
    pub fn mark_as_read(&self, reader: &str, other: &str) -> SocialResult<usize> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE direct_messages
             SET is_read = 1
             WHERE receiver_username = ? AND sender_username = ? AND is_read = 0",
            [reader, other],
        )?;
        Ok(updated)
    }

    /// Unread messages addressed to `username` across all conversations
    pub fn get_unread_count(&self, username: &str) -> SocialResult<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM direct_messages WHERE receiver_username = ? AND is_read = 0",
            [username],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{add_user, setup_test_pool};

    fn setup() -> DirectMessageRepository {
        let pool = setup_test_pool();
        for name in ["alice", "bob", "carol"] {
            add_user(&pool, name);
        }
        DirectMessageRepository::new(pool)
    }

    #[test]
    fn test_send_creates_conversation_summary() {
        let repo = setup();
        repo.send("alice", "bob", "hi").unwrap();

        let inbox = repo.get_conversations_for("bob").unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].other_user, "alice");
        assert_eq!(inbox[0].last_message, "hi");
        assert_eq!(inbox[0].unread_count, 1);

        let outbox = repo.get_conversations_for("alice").unwrap();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].other_user, "bob");
        assert_eq!(outbox[0].unread_count, 0);
    }

    #[test]
    fn test_conversation_is_symmetric_and_chronological() {
        let repo = setup();
        repo.send("alice", "bob", "one").unwrap();
        repo.send("bob", "alice", "two").unwrap();
        repo.send("alice", "bob", "three").unwrap();
        repo.send("alice", "carol", "elsewhere").unwrap();

        let from_alice: Vec<String> = repo
            .get_conversation("alice", "bob")
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(from_alice, vec!["one", "two", "three"]);
        assert_eq!(repo.get_conversation("bob", "alice").unwrap().len(), 3);

        // One conversation row per pair, regardless of direction
        let inbox = repo.get_conversations_for("alice").unwrap();
        assert_eq!(inbox.len(), 2);
        let bob = inbox.iter().find(|c| c.other_user == "bob").unwrap();
        assert_eq!(bob.last_message, "three");
        assert_eq!(bob.unread_count, 1);
    }

    #[test]
    fn test_mark_as_read_clears_unread() {
        let repo = setup();
        repo.send("alice", "bob", "hi").unwrap();
        repo.send("alice", "bob", "you there?").unwrap();
        assert_eq!(repo.get_unread_count("bob").unwrap(), 2);

        assert_eq!(repo.mark_as_read("bob", "alice").unwrap(), 2);
        assert_eq!(repo.get_unread_count("bob").unwrap(), 0);
        assert_eq!(repo.get_conversations_for("bob").unwrap()[0].unread_count, 0);
    }

    #[test]
    fn test_send_to_unknown_user() {
        let repo = setup();
        assert!(matches!(
            repo.send("alice", "zed", "hello"),
            Err(SocialError::NotFound(_))
        ));
        assert!(repo.get_conversations_for("alice").unwrap().is_empty());
    }
}
