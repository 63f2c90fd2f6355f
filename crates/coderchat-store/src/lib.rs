//! # coderchat-store
//!
//! Durable conversation store for coderchat, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides the user directory (registration and
//! credential checks) plus the per-user, append-only chat log.  Every write
//! runs in its own immediate transaction; callers that share one handle
//! across tasks wrap it in a mutex, which makes the handle the single writer.

pub mod chats;
pub mod credential;
pub mod database;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
