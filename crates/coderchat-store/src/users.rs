//! User directory: registration, credential checks and lookups.

use coderchat_shared::UserId;
use rusqlite::{params, ErrorCode, OptionalExtension};

use crate::credential::{hash_credential, verify_credential};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::User;

impl Database {
    /// Create a new account.
    ///
    /// Fails with [`StoreError::DuplicateUser`] when the username is taken,
    /// whatever credential is supplied.
    pub fn register_user(&mut self, username: &str, credential: &str) -> Result<UserId> {
        let stored = hash_credential(credential);

        let tx = self.write_tx()?;
        let inserted = tx.execute(
            "INSERT INTO users (username, password) VALUES (?1, ?2)",
            params![username, stored],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::DuplicateUser(username.to_string()));
            }
            Err(other) => return Err(other.into()),
        }

        let id = UserId(tx.last_insert_rowid());
        tx.commit()?;

        tracing::info!(user_id = %id, username, "user registered");
        Ok(id)
    }

    /// Return the user's id if `credential` matches the registered one.
    pub fn authenticate(&self, username: &str, credential: &str) -> Result<Option<UserId>> {
        let row: Option<(i64, String)> = self
            .conn()
            .query_row(
                "SELECT id, password FROM users WHERE username = ?1",
                params![username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.and_then(|(id, stored)| {
            verify_credential(&stored, credential).then_some(UserId(id))
        }))
    }

    /// Fetch a user by id.
    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, username FROM users WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok(User {
                        id: UserId(row.get(0)?),
                        username: row.get(1)?,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Unavailable(other),
            })
    }
}
