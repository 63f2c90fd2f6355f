use coderchat_shared::RoleError;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Registration with a username that is already taken.
    #[error("Username already exists: {0}")]
    DuplicateUser(String),

    /// A message role outside `user` / `assistant`.
    #[error(transparent)]
    InvalidRole(#[from] RoleError),

    /// SQLite failed (I/O, locking, corruption).  Not retried.
    #[error("Storage unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
