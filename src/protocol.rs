//! Wire protocol shared by the server and the client.
//!
//! All payloads are textual JSON with camelCase field names. Messages are
//! modeled as one tagged union per direction so the boundary can match
//! exhaustively and reject unknown tags instead of falling through:
//!
//! - client → server: `{"type":"setUserId","userId":...}` or
//!   `{"type":"message","sender":...,"text":...,"timestamp":...,"localId":...}`
//! - server → client: `{"type":"users","users":[...]}` or the delivered chat
//!   copy, which carries no `type` wrapper — exactly the four fields
//!   `sender`, `text`, `timestamp`, `localId` as the sender supplied them.

use serde::{Deserialize, Serialize};

/// A chat message as it travels on the wire.
///
/// `timestamp` and `local_id` are client-supplied and relayed verbatim by the
/// server; both tolerate absence on decode for senders that never set them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub local_id: Option<String>,
}

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientToServer {
    /// Register this connection under a user identifier.
    #[serde(rename = "setUserId", rename_all = "camelCase")]
    SetUserId { user_id: String },
    /// A chat message to broadcast to everyone, the sender included.
    #[serde(rename = "message")]
    Message(ChatMessage),
}

/// Full snapshot of the registered user identifiers, sent to every client
/// after each net registry change. Always the whole set, never a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "users")]
pub struct PresenceSnapshot {
    pub users: Vec<String>,
}

/// Messages the server sends to a client.
///
/// Untagged: the presence snapshot is recognized by its `"type":"users"`
/// field, the delivered chat copy by its bare `sender`/`text` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerToClient {
    Users(PresenceSnapshot),
    Chat(ChatMessage),
}
