//! Row mappers shared by the repositories

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

use murmur_types::{DeletedPost, DeletedUser, DirectMessage, Post, Reply, User};

/// Read an RFC3339 text column as a UTC timestamp
pub(crate) fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Columns: username, joined_at
pub(crate) fn user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        username: row.get(0)?,
        joined_at: timestamp(row, 1)?,
    })
}

/// Columns: id, username, content, created_at
pub(crate) fn post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        username: row.get(1)?,
        content: row.get(2)?,
        created_at: timestamp(row, 3)?,
    })
}

/// Columns: id, post_id, username, content, created_at, parent_reply_id, parent_username
pub(crate) fn reply(row: &Row<'_>) -> rusqlite::Result<Reply> {
    Ok(Reply {
        id: row.get(0)?,
        post_id: row.get(1)?,
        username: row.get(2)?,
        content: row.get(3)?,
        created_at: timestamp(row, 4)?,
        parent_reply_id: row.get(5)?,
        parent_username: row.get(6)?,
    })
}

/// Columns: id, sender_username, receiver_username, content, created_at, is_read
pub(crate) fn direct_message(row: &Row<'_>) -> rusqlite::Result<DirectMessage> {
    Ok(DirectMessage {
        id: row.get(0)?,
        sender: row.get(1)?,
        receiver: row.get(2)?,
        content: row.get(3)?,
        created_at: timestamp(row, 4)?,
        is_read: row.get::<_, i64>(5)? != 0,
    })
}

/// Columns: username, joined_at, deleted_at
pub(crate) fn deleted_user(row: &Row<'_>) -> rusqlite::Result<DeletedUser> {
    Ok(DeletedUser {
        username: row.get(0)?,
        joined_at: timestamp(row, 1)?,
        deleted_at: timestamp(row, 2)?,
    })
}

/// Columns: id, username, content, created_at, deleted_at
pub(crate) fn deleted_post(row: &Row<'_>) -> rusqlite::Result<DeletedPost> {
    Ok(DeletedPost {
        id: row.get(0)?,
        username: row.get(1)?,
        content: row.get(2)?,
        created_at: timestamp(row, 3)?,
        deleted_at: timestamp(row, 4)?,
    })
}
