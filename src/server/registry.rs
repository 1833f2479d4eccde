//! Connection registry: the single source of truth for who is connected and
//! the fan-out point for all broadcasts.
//!
//! The registry is a plain owned value; the server wraps it in
//! `Arc<Mutex<_>>` so that each register/deregister/broadcast runs as one
//! critical section. Sends are fire-and-forget — a recipient that closed
//! between snapshot and send is logged and skipped, never removed here
//! (removal only happens through the connection's close path).

use std::collections::HashMap;
use std::fmt;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::protocol::{ChatMessage, PresenceSnapshot};

/// Opaque identity tag for one physical WebSocket connection.
///
/// Deregistration matches on this tag rather than on the user id, because a
/// connection may close before (or instead of) ever registering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The server's handle to one client connection: the identity tag plus the
/// channel feeding that connection's socket writer task.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    conn_id: ConnectionId,
    sender: UnboundedSender<String>,
}

impl ClientHandle {
    pub fn new(conn_id: ConnectionId, sender: UnboundedSender<String>) -> Self {
        Self { conn_id, sender }
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    /// Whether the connection's writer is still able to accept payloads.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Fire-and-forget send. `false` means the connection is gone.
    pub fn send(&self, payload: String) -> bool {
        self.sender.send(payload).is_ok()
    }
}

/// In-memory mapping from user identifier to live connection handle.
///
/// Invariant: at most one session per user id. The registry owns the
/// sessions; a connection only carries its [`ConnectionId`] tag for
/// find-and-remove on close.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: HashMap<String, ClientHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the mapping iff `user_id` is not already present; returns
    /// whether it was newly inserted.
    ///
    /// Re-registration of a present user id is a deliberate no-op: it never
    /// replaces the existing connection and the caller must not broadcast
    /// presence for it. This makes duplicate `setUserId` messages harmless.
    pub fn register(&mut self, user_id: &str, handle: ClientHandle) -> bool {
        if self.sessions.contains_key(user_id) {
            return false;
        }
        self.sessions.insert(user_id.to_string(), handle);
        true
    }

    /// Remove the session owning this connection, if any, and return the
    /// freed user id. Identity match on the connection tag, not the user id.
    pub fn deregister(&mut self, conn_id: ConnectionId) -> Option<String> {
        let user_id = self
            .sessions
            .iter()
            .find(|(_, handle)| handle.conn_id() == conn_id)
            .map(|(user_id, _)| user_id.clone())?;
        self.sessions.remove(&user_id);
        Some(user_id)
    }

    /// Current registered user identifiers, sorted for a deterministic
    /// snapshot order.
    pub fn users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.sessions.keys().cloned().collect();
        users.sort();
        users
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Send the full presence snapshot to every registered connection that
    /// is currently open. Closed connections are skipped.
    pub fn broadcast_presence(&self) {
        let snapshot = PresenceSnapshot {
            users: self.users(),
        };
        let payload = serde_json::to_string(&snapshot).unwrap();

        for (user_id, handle) in self.sessions.iter() {
            if !handle.is_open() {
                tracing::debug!("Skipping presence for closed connection of '{}'", user_id);
                continue;
            }
            if !handle.send(payload.clone()) {
                tracing::warn!("Failed to send presence snapshot to '{}'", user_id);
            }
        }
    }

    /// Send a chat message to every registered connection, the sender's own
    /// included. The server does no origin filtering: the client's
    /// reconciliation layer is the single place that decides self vs. other,
    /// and the sender's echo doubles as its delivery confirmation.
    pub fn broadcast_message(&self, message: &ChatMessage) {
        let payload = serde_json::to_string(message).unwrap();

        for (user_id, handle) in self.sessions.iter() {
            if !handle.send(payload.clone()) {
                tracing::warn!("Failed to send message to '{}'", user_id);
            }
        }
    }
}
