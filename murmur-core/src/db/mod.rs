pub mod schema;
pub mod connection;
pub mod repositories;
pub(crate) mod rows;

pub use connection::{Database, DbConnection, DbPool};
