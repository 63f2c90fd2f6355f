use thiserror::Error;

/// A role string outside the `user` / `assistant` enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid role: {0:?} (expected \"user\" or \"assistant\")")]
pub struct RoleError(pub String);
