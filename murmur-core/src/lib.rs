//! Data access layer for the murmur social network
//!
//! The CLI and integration tests drive everything through [`SocialService`].

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod moderation;
pub mod service;
pub mod snapshot;

pub use config::Settings;
pub use db::Database;
pub use error::{SocialError, SocialResult};
pub use moderation::AdminConsole;
pub use service::SocialService;
