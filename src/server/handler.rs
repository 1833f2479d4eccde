//! WebSocket and HTTP endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::protocol::ClientToServer;
use crate::server::registry::{ClientHandle, ConnectionId};
use crate::server::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Identity registration happens later, via setUserId; until then this
    // connection is only known by its tag.
    let conn_id = ConnectionId::generate();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let handle = ClientHandle::new(conn_id, tx);

    tracing::debug!("WebSocket connection {} established", conn_id);

    // Writer task: everything broadcast to this connection goes through the
    // channel so registry fan-out never blocks on a slow socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // Reader task: decode incoming payloads and drive the registry. All
    // registry mutations and the broadcasts they trigger happen under one
    // lock acquisition per event, preserving per-registry delivery order.
    let registry = state.registry.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on {}: {}", conn_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let incoming = match serde_json::from_str::<ClientToServer>(&text) {
                        Ok(incoming) => incoming,
                        Err(e) => {
                            // Malformed payloads are dropped for this one
                            // message; the connection stays open.
                            tracing::warn!("Dropping malformed payload on {}: {}", conn_id, e);
                            continue;
                        }
                    };

                    match incoming {
                        ClientToServer::SetUserId { user_id } => {
                            let mut registry = registry.lock().await;
                            if registry.register(&user_id, handle.clone()) {
                                tracing::info!("User {} connected", user_id);
                                registry.broadcast_presence();
                            } else {
                                tracing::debug!(
                                    "Duplicate setUserId for '{}' on {}, ignoring",
                                    user_id,
                                    conn_id
                                );
                            }
                        }
                        ClientToServer::Message(chat) => {
                            // The client-supplied sender and timestamp are
                            // relayed verbatim, not validated against the
                            // registered identity.
                            tracing::debug!(
                                "Broadcasting message from '{}': {}",
                                chat.sender,
                                chat.text
                            );
                            let registry = registry.lock().await;
                            registry.broadcast_message(&chat);
                        }
                    }
                }
                Message::Close(_) => {
                    tracing::debug!("Connection {} requested close", conn_id);
                    break;
                }
                // Ping/pong is handled by the protocol layer; binary frames
                // are not part of the contract.
                _ => {}
            }
        }
    });

    // If either side of the connection finishes, tear down the other.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let mut registry = state.registry.lock().await;
    if let Some(user_id) = registry.deregister(conn_id) {
        tracing::info!("User {} disconnected", user_id);
        registry.broadcast_presence();
    } else {
        tracing::debug!("Connection {} closed before registering", conn_id);
    }
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current registered user identifiers, sorted.
pub async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let registry = state.registry.lock().await;
    Json(registry.users())
}
