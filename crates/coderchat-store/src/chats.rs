//! The per-user, append-only chat log.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use coderchat_shared::{ChatTurn, MessageId, Role, UserId};
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::ChatMessage;

impl Database {
    /// Append one message to the user's log.
    ///
    /// The role is validated before anything is written; an unknown role
    /// fails with [`StoreError::InvalidRole`] and leaves the log unchanged.
    /// The timestamp is `now`, clamped so it is never earlier than the
    /// user's latest message.
    ///
    /// [`StoreError::InvalidRole`]: crate::StoreError::InvalidRole
    pub fn append_message(
        &mut self,
        user_id: UserId,
        role: impl AsRef<str>,
        content: &str,
    ) -> Result<MessageId> {
        let role = Role::parse(role.as_ref())?;

        let tx = self.write_tx()?;

        let latest: Option<String> = tx
            .query_row(
                "SELECT timestamp FROM chats
                 WHERE user_id = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT 1",
                params![user_id.0],
                |row| row.get(0),
            )
            .optional()?;

        let now = Utc::now();
        let timestamp = match latest.as_deref().and_then(parse_timestamp) {
            Some(prev) if prev > now => prev,
            _ => now,
        };

        tx.execute(
            "INSERT INTO chats (user_id, role, content, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id.0, role.as_str(), content, format_timestamp(&timestamp)],
        )?;
        let id = MessageId(tx.last_insert_rowid());
        tx.commit()?;

        tracing::debug!(user_id = %user_id, message_id = %id, role = %role, "message appended");
        Ok(id)
    }

    /// All of the user's messages, oldest first.  Ties on timestamp are
    /// broken by id, i.e. insertion order.
    pub fn list_messages(&self, user_id: UserId) -> Result<Vec<ChatMessage>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, role, content, timestamp
             FROM chats
             WHERE user_id = ?1
             ORDER BY timestamp ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![user_id.0], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Fetch a single message by id.
    pub fn get_message(&self, id: MessageId) -> Result<ChatMessage> {
        self.conn()
            .query_row(
                "SELECT id, user_id, role, content, timestamp
                 FROM chats WHERE id = ?1",
                params![id.0],
                row_to_message,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Unavailable(other),
            })
    }

    /// The user's log as (role, content) pairs, ready for a completion call.
    pub fn history(&self, user_id: UserId) -> Result<Vec<ChatTurn>> {
        Ok(self
            .list_messages(user_id)?
            .into_iter()
            .map(ChatTurn::from)
            .collect())
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    // Fixed width so that text ordering in SQL matches chronological order.
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC-3339 and SQLite's `CURRENT_TIMESTAMP` layout (older rows).
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
    let id: i64 = row.get(0)?;
    let user_id: i64 = row.get(1)?;
    let role_str: String = row.get(2)?;
    let content: String = row.get(3)?;
    let ts_str: String = row.get(4)?;

    let role = Role::parse(&role_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let timestamp = parse_timestamp(&ts_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unrecognised timestamp: {ts_str}").into(),
        )
    })?;

    Ok(ChatMessage {
        id: MessageId(id),
        user_id: UserId(user_id),
        role,
        content,
        timestamp,
    })
}
