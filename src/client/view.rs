//! Message reconciliation: one ordered view of the conversation that shows
//! the user's own messages the instant they are sent, then folds the server's
//! broadcast echoes back into it.
//!
//! The view is pure synchronous state driven from the client's single event
//! loop; no locking is involved. Once the server echo for a message has
//! arrived, the view never shows two rows for it — reconciliation nets to
//! exactly one.

use uuid::Uuid;

use crate::protocol::{ChatMessage, ServerToClient};

/// One row of the rendered conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage {
    pub sender: String,
    pub text: String,
    pub timestamp: i64,
    pub local_id: Option<String>,
    /// Whether this row was sent by the local user.
    pub is_self: bool,
    /// True only for an optimistic row not yet confirmed by a server echo.
    pub pending: bool,
}

/// What a single incoming event did to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChange {
    /// A new confirmed row was appended at `index`.
    Appended { index: usize },
    /// The pending row at `index` was confirmed in place; the list length is
    /// unchanged and the row keeps its position.
    Confirmed { index: usize },
    /// A pending row without a usable localId match was removed and the
    /// confirmed copy appended at `index` (fallback dedupe).
    Deduped { index: usize },
    /// The presence list was replaced wholesale; messages untouched.
    Presence,
}

/// Ordered conversation view plus the current presence list.
#[derive(Debug)]
pub struct MessageView {
    user_id: String,
    messages: Vec<DisplayMessage>,
    users: Vec<String>,
}

impl MessageView {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            messages: Vec::new(),
            users: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Append a pending row for an outgoing message and return the wire
    /// message carrying the same localId.
    ///
    /// Returns `None` when the trimmed text is empty; the caller additionally
    /// guards on transport readiness, so an offline send never creates a row.
    pub fn send_optimistic(&mut self, text: &str, now: i64) -> Option<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let local_id = next_local_id(now);
        self.messages.push(DisplayMessage {
            sender: self.user_id.clone(),
            text: text.to_string(),
            timestamp: now,
            local_id: Some(local_id.clone()),
            is_self: true,
            pending: true,
        });

        Some(ChatMessage {
            sender: self.user_id.clone(),
            text: text.to_string(),
            timestamp: Some(now),
            local_id: Some(local_id),
        })
    }

    /// Fold one server event into the view. `now` is the receipt time, used
    /// when the incoming message carries no timestamp.
    pub fn apply(&mut self, incoming: ServerToClient, now: i64) -> ViewChange {
        match incoming {
            ServerToClient::Users(snapshot) => {
                self.users = snapshot.users;
                ViewChange::Presence
            }
            ServerToClient::Chat(message) => self.apply_chat(message, now),
        }
    }

    fn apply_chat(&mut self, message: ChatMessage, now: i64) -> ViewChange {
        let timestamp = message.timestamp.unwrap_or(now);
        let is_self = message.sender == self.user_id;

        // Primary path: the echo carries a localId matching an existing row.
        // Replace that row in place so the message keeps its position.
        if let Some(local_id) = message.local_id.as_deref() {
            let found = self
                .messages
                .iter()
                .position(|row| row.local_id.as_deref() == Some(local_id));
            if let Some(index) = found {
                self.messages[index] = DisplayMessage {
                    sender: message.sender,
                    text: message.text,
                    timestamp,
                    local_id: message.local_id,
                    is_self,
                    pending: false,
                };
                return ViewChange::Confirmed { index };
            }
        }

        // Fallback for echoes without a usable localId (older sessions):
        // drop the oldest still-pending row with the same sender and text,
        // then append the confirmed copy. Trades position preservation for
        // at-least dedupe.
        if is_self {
            let found = self
                .messages
                .iter()
                .position(|row| row.pending && row.sender == message.sender && row.text == message.text);
            if let Some(removed) = found {
                self.messages.remove(removed);
                self.messages.push(DisplayMessage {
                    sender: message.sender,
                    text: message.text,
                    timestamp,
                    local_id: message.local_id,
                    is_self,
                    pending: false,
                });
                return ViewChange::Deduped {
                    index: self.messages.len() - 1,
                };
            }
        }

        self.messages.push(DisplayMessage {
            sender: message.sender,
            text: message.text,
            timestamp,
            local_id: message.local_id,
            is_self,
            pending: false,
        });
        ViewChange::Appended {
            index: self.messages.len() - 1,
        }
    }
}

/// Fresh correlation token: send time plus a random suffix, unique per
/// sending client with overwhelming probability.
fn next_local_id(now: i64) -> String {
    format!("{now:x}-{}", Uuid::new_v4().simple())
}
