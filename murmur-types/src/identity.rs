use serde::{Deserialize, Serialize};

use crate::enums::Role;

/// Session identity returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

impl Identity {
    /// Identity for an account stored in the users table
    pub fn regular(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::Regular,
        }
    }

    /// Identity for the configured administrator (never stored in users)
    pub fn administrator(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::Administrator,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
