//! CLI chat client: reconnecting transport plus the reconciliation view,
//! rendered as plain lines on stdout with rustyline input.

pub mod transport;
pub mod view;

pub use transport::{RECONNECT_DELAY, Transport, TransportEvent};
pub use view::{DisplayMessage, MessageView, ViewChange};

use clap::Parser;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use crate::error::ClientError;
use crate::protocol::ClientToServer;
use crate::time::{format_clock, now_millis};

/// Client configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "banter-client", about = "CLI client for the banter chat server")]
pub struct ClientConfig {
    /// Display name to register with the server
    #[arg(long)]
    pub user_id: String,

    /// WebSocket endpoint of the chat server
    #[arg(long, default_value = "ws://127.0.0.1:3001/ws")]
    pub url: String,
}

/// Run the client until the user exits with ctrl-c or ctrl-d.
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let (transport, mut events) = Transport::spawn(config.url.clone(), config.user_id.clone());
    let mut view = MessageView::new(config.user_id);

    // rustyline blocks, so it runs on its own thread feeding lines into the
    // async loop.
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let input = std::thread::spawn(move || -> Result<(), ClientError> {
        let mut editor = rustyline::DefaultEditor::new()?;
        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    if line_tx.send(line).is_err() {
                        return Ok(());
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    });

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(TransportEvent::Opened) => {
                    println!("* connected as {}", view.user_id());
                }
                Some(TransportEvent::Closed) => {
                    println!("* disconnected, reconnecting...");
                }
                Some(TransportEvent::Incoming(incoming)) => {
                    render(&mut view, incoming);
                }
                None => break,
            },
            line = line_rx.recv() => match line {
                Some(line) => {
                    if !transport.is_ready() {
                        println!("* offline, message not sent");
                        continue;
                    }
                    let now = now_millis();
                    if let Some(wire) = view.send_optimistic(&line, now) {
                        println!("[{}] you: {} (sending...)", format_clock(now), wire.text);
                        if transport.send(&ClientToServer::Message(wire)).is_err() {
                            println!("* offline, message not sent");
                        }
                    }
                }
                // Input thread finished: ctrl-c / ctrl-d.
                None => break,
            },
        }
    }

    transport.close().await;
    match input.join() {
        Ok(result) => result,
        Err(_) => Ok(()),
    }
}

fn render(view: &mut MessageView, incoming: crate::protocol::ServerToClient) {
    match view.apply(incoming, now_millis()) {
        ViewChange::Appended { index } => {
            let row = &view.messages()[index];
            let name = if row.is_self { "you" } else { row.sender.as_str() };
            println!("[{}] {}: {}", format_clock(row.timestamp), name, row.text);
        }
        ViewChange::Presence => {
            println!("* online: {}", view.users().join(", "));
        }
        // Own rows were already rendered at send time.
        ViewChange::Confirmed { .. } | ViewChange::Deduped { .. } => {}
    }
}
