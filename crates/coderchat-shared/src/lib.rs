pub mod constants;
pub mod error;
pub mod types;

pub use error::RoleError;
pub use types::{ChatTurn, MessageId, Role, UserId};
