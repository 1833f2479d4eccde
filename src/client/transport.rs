//! Reconnecting WebSocket transport.
//!
//! One spawned task owns at most one physical connection at a time. When the
//! connection closes or errors, the task flips not-ready, drops the stale
//! streams (there is no handler left to fire for the old socket), waits
//! [`RECONNECT_DELAY`], and dials a brand-new connection. Each physical
//! connection registers the identity exactly once — a reconnect is a fresh
//! registration, because the server forgot us when the old socket closed.
//!
//! The transport never queues offline: `send` rejects with
//! [`ClientError::NotConnected`] while no connection is open, and anything
//! that raced into the channel during teardown is drained before the next
//! connection, so stale payloads are never flushed to a fresh socket.

use std::time::Duration;

use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};

use crate::error::ClientError;
use crate::protocol::{ClientToServer, ServerToClient};

/// Fixed delay between losing a connection and dialing the next one.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Events the transport reports to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A physical connection is open and the identity has been registered.
    Opened,
    /// The current physical connection was lost; a reconnect is scheduled.
    Closed,
    /// A decoded server message.
    Incoming(ServerToClient),
}

/// Handle to the reconnecting transport task.
pub struct Transport {
    outgoing: mpsc::UnboundedSender<String>,
    ready: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl Transport {
    /// Spawn the transport task. Events arrive on the returned receiver.
    pub fn spawn(
        url: String,
        user_id: String,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = watch::channel(false);

        let task = tokio::spawn(run(url, user_id, ready_tx, event_tx, outgoing_rx));

        (
            Self {
                outgoing: outgoing_tx,
                ready: ready_rx,
                task,
            },
            event_rx,
        )
    }

    /// Whether a physical connection is currently open.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Queue a message on the open connection. Rejected while disconnected.
    pub fn send(&self, message: &ClientToServer) -> Result<(), ClientError> {
        if !self.is_ready() {
            return Err(ClientError::NotConnected);
        }
        let payload = serde_json::to_string(message).unwrap();
        self.outgoing
            .send(payload)
            .map_err(|_| ClientError::NotConnected)
    }

    /// Tear the transport down: close the physical connection and cancel any
    /// pending reconnect timer.
    pub async fn close(self) {
        drop(self.outgoing);
        let _ = self.task.await;
    }
}

enum PumpExit {
    /// The owner dropped its side; the socket was closed cleanly.
    Teardown,
    /// The connection was lost; reconnect.
    Lost,
}

async fn run(
    url: String,
    user_id: String,
    ready: watch::Sender<bool>,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut outgoing: mpsc::UnboundedReceiver<String>,
) {
    loop {
        match connect_async(&url).await {
            Ok((stream, _response)) => {
                tracing::debug!("Connected to {}", url);
                match pump(stream, &user_id, &ready, &events, &mut outgoing).await {
                    PumpExit::Teardown => return,
                    PumpExit::Lost => {
                        let _ = events.send(TransportEvent::Closed);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Connection to {} failed: {}", url, e);
            }
        }

        // Anything sent in the race window before ready flipped false must
        // not be flushed to the next connection.
        while outgoing.try_recv().is_ok() {}

        tokio::select! {
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            // Owner gone during the backoff: cancel the reconnect timer.
            _ = drained(&mut outgoing) => return,
        }
    }
}

/// Resolves once the outgoing channel is closed, swallowing stragglers.
async fn drained(outgoing: &mut mpsc::UnboundedReceiver<String>) {
    while outgoing.recv().await.is_some() {}
}

async fn pump(
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    user_id: &str,
    ready: &watch::Sender<bool>,
    events: &mpsc::UnboundedSender<TransportEvent>,
    outgoing: &mut mpsc::UnboundedReceiver<String>,
) -> PumpExit {
    let (mut sink, mut source) = stream.split();

    // Register the identity exactly once per physical connection.
    let hello = serde_json::to_string(&ClientToServer::SetUserId {
        user_id: user_id.to_string(),
    })
    .unwrap();
    if sink.send(Message::Text(hello.into())).await.is_err() {
        return PumpExit::Lost;
    }

    let _ = ready.send(true);
    let _ = events.send(TransportEvent::Opened);

    let exit = loop {
        tokio::select! {
            out = outgoing.recv() => match out {
                Some(payload) => {
                    if sink.send(Message::Text(payload.into())).await.is_err() {
                        break PumpExit::Lost;
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break PumpExit::Teardown;
                }
            },
            msg = source.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerToClient>(&text) {
                        Ok(incoming) => {
                            let _ = events.send(TransportEvent::Incoming(incoming));
                        }
                        Err(e) => {
                            tracing::warn!("Dropping malformed server frame: {}", e);
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break PumpExit::Lost,
                Some(Err(e)) => {
                    // An erroring socket is closed immediately; the reconnect
                    // path below is the same as for a clean close.
                    tracing::warn!("Socket error: {}", e);
                    break PumpExit::Lost;
                }
                Some(Ok(_)) => {}
            },
        }
    };

    let _ = ready.send(false);
    exit
}
