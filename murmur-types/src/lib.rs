pub mod models;
pub mod enums;
pub mod identity;

pub use models::*;
pub use enums::*;
pub use identity::*;
