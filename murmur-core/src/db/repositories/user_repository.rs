use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use murmur_types::User;

use crate::db::{rows, DbPool};
use crate::error::{is_unique_violation, SocialError, SocialResult};

pub struct UserRepository {
    pool: DbPool,
}

/// Check whether a live account exists, on an already checked-out connection
pub(crate) fn user_exists(conn: &Connection, username: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)",
        [username],
        |row| row.get(0),
    )
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Register a new account
    ///
    /// Usernames still held in the deleted-user archive are treated as taken so
    /// the archived account stays recoverable.
    pub fn create(&self, username: &str, password: &str) -> SocialResult<User> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let archived: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM recently_deleted_users WHERE username = ?)",
            [username],
            |row| row.get(0),
        )?;
        if archived {
            return Err(SocialError::DuplicateUsername(username.to_string()));
        }

        let user = tx
            .query_row(
                "INSERT INTO users (username, password) VALUES (?, ?)
                 RETURNING username, joined_at",
                [username, password],
                rows::user,
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    SocialError::DuplicateUsername(username.to_string())
                } else {
                    e.into()
                }
            })?;

        tx.commit()?;
        Ok(user)
    }

    /// Exact, case-sensitive username and password match
    pub fn verify_credentials(&self, username: &str, password: &str) -> SocialResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT username, joined_at FROM users WHERE username = ? AND password = ?",
                [username, password],
                rows::user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by username
    pub fn get_by_username(&self, username: &str) -> SocialResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT username, joined_at FROM users WHERE username = ?",
                [username],
                rows::user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn exists(&self, username: &str) -> SocialResult<bool> {
        let conn = self.pool.get()?;
        Ok(user_exists(&conn, username)?)
    }

    /// Get all users, alphabetically
    pub fn list_all(&self) -> SocialResult<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT username, joined_at FROM users ORDER BY username")?;
        let users = stmt
            .query_map([], rows::user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::setup_test_pool;

    #[test]
    fn test_register_then_duplicate() {
        let repo = UserRepository::new(setup_test_pool());

        let user = repo.create("alice", "p").unwrap();
        assert_eq!(user.username, "alice");

        let err = repo.create("alice", "p").unwrap_err();
        assert_eq!(err, SocialError::DuplicateUsername("alice".to_string()));
    }

    #[test]
    fn test_archived_username_is_taken() {
        let pool = setup_test_pool();
        {
            let conn = pool.get().unwrap();
            conn.execute(
                "INSERT INTO recently_deleted_users (username, password, joined_at)
                 VALUES ('ghost', 'pw', '2024-01-01T00:00:00.000Z')",
                [],
            )
            .unwrap();
        }
        let repo = UserRepository::new(pool);
        assert!(matches!(
            repo.create("ghost", "new"),
            Err(SocialError::DuplicateUsername(_))
        ));
    }

    #[test]
    fn test_verify_credentials_is_exact() {
        let repo = UserRepository::new(setup_test_pool());
        repo.create("alice", "Secret").unwrap();

        assert!(repo.verify_credentials("alice", "Secret").unwrap().is_some());
        assert!(repo.verify_credentials("alice", "secret").unwrap().is_none());
        assert!(repo.verify_credentials("Alice", "Secret").unwrap().is_none());
        assert!(repo.verify_credentials("bob", "Secret").unwrap().is_none());
    }

    #[test]
    fn test_list_all_sorted() {
        let repo = UserRepository::new(setup_test_pool());
        repo.create("carol", "p").unwrap();
        repo.create("alice", "p").unwrap();

        let names: Vec<String> = repo.list_all().unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["alice", "carol"]);
        assert!(repo.exists("carol").unwrap());
        assert!(!repo.exists("bob").unwrap());
    }
}
