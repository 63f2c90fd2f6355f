//! The conversation loop: store the prompt, replay the history to the
//! completion gateway, store the reply.

use std::sync::{Arc, Mutex, MutexGuard};

use coderchat_gateway::CompletionGateway;
use coderchat_shared::{Role, UserId};
use coderchat_store::{ChatMessage, Database};
use tracing::{info, warn};

use crate::error::ServerError;

/// The one database handle shared by every request.  The mutex is the
/// single-writer point; it is never held across an `.await`.
pub type SharedDatabase = Arc<Mutex<Database>>;

pub fn lock_db(db: &SharedDatabase) -> Result<MutexGuard<'_, Database>, ServerError> {
    db.lock()
        .map_err(|e| ServerError::Internal(format!("Lock poisoned: {e}")))
}

/// Both sides of one prompt/reply round.
#[derive(Debug)]
pub struct Exchange {
    pub user: ChatMessage,
    pub assistant: ChatMessage,
    /// Set when the gateway failed and `assistant` holds a placeholder.
    pub notice: Option<String>,
}

/// Run one chat turn for `user_id`.
///
/// The prompt is stored before the gateway is called, and an assistant
/// message is always stored afterwards: the reply on success, the
/// placeholder text on any gateway failure.
pub async fn submit_prompt(
    db: &SharedDatabase,
    gateway: &dyn CompletionGateway,
    user_id: UserId,
    prompt: &str,
) -> Result<Exchange, ServerError> {
    if prompt.trim().is_empty() {
        return Err(ServerError::BadRequest("Prompt must not be empty".into()));
    }

    let (user, history) = {
        let mut guard = lock_db(db)?;
        let id = guard.append_message(user_id, Role::User, prompt)?;
        (guard.get_message(id)?, guard.history(user_id)?)
    };

    let (reply, notice) = match gateway.complete(&history).await {
        Ok(reply) => (reply, None),
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "completion failed, storing placeholder");
            (e.placeholder_reply().to_string(), Some(e.user_notice()))
        }
    };

    let assistant = {
        let mut guard = lock_db(db)?;
        let id = guard.append_message(user_id, Role::Assistant, &reply)?;
        guard.get_message(id)?
    };

    info!(
        user_id = %user_id,
        turns = history.len(),
        failed = notice.is_some(),
        "chat turn complete"
    );

    Ok(Exchange {
        user,
        assistant,
        notice,
    })
}
