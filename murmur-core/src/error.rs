//! Error taxonomy for the data access layer
//!
//! Every storage fault is converted into `SocialError` at the operation
//! boundary; nothing from rusqlite or r2d2 reaches callers unconverted.

use thiserror::Error;

pub type SocialResult<T> = Result<T, SocialError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocialError {
    /// A required field was blank or malformed; raised before touching storage
    #[error("Validation error: {0}")]
    Validation(String),

    /// Registration collided with an existing (or archived) username
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Referenced user, post, reply, or archive entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Ownership or role check failed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The operation would break a cross-table invariant
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other persistence failure, including connectivity loss
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SocialError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SocialError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        SocialError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        SocialError::Forbidden(msg.into())
    }
}

impl From<rusqlite::Error> for SocialError {
    fn from(err: rusqlite::Error) -> Self {
        SocialError::Storage(err.to_string())
    }
}

impl From<r2d2::Error> for SocialError {
    fn from(err: r2d2::Error) -> Self {
        SocialError::Storage(format!("connection pool: {}", err))
    }
}

/// True when a rusqlite error is a UNIQUE or PRIMARY KEY violation
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == rusqlite::ErrorCode::ConstraintViolation
                && (failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}
