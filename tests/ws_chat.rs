//! End-to-end WebSocket tests against a real server instance.

mod fixtures;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use fixtures::TestServer;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(url: &str) -> Socket {
    let (ws, _response) = connect_async(url).await.expect("Failed to connect");
    ws
}

async fn send_json(ws: &mut Socket, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("Failed to send");
}

async fn recv_json(ws: &mut Socket) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Connection closed")
            .expect("WebSocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("Frame is not JSON");
        }
    }
}

async fn register(ws: &mut Socket, user_id: &str) {
    send_json(ws, json!({"type": "setUserId", "userId": user_id})).await;
}

#[tokio::test]
async fn test_registration_broadcasts_presence() {
    // given:
    let server = TestServer::start(19090).await;

    // when: alice then bob register, in order
    let mut alice = connect(&server.ws_url()).await;
    register(&mut alice, "alice").await;
    assert_eq!(recv_json(&mut alice).await, json!({"type": "users", "users": ["alice"]}));

    let mut bob = connect(&server.ws_url()).await;
    register(&mut bob, "bob").await;

    // then: the full sorted snapshot reaches both
    let expected = json!({"type": "users", "users": ["alice", "bob"]});
    assert_eq!(recv_json(&mut alice).await, expected);
    assert_eq!(recv_json(&mut bob).await, expected);
}

#[tokio::test]
async fn test_message_broadcast_reaches_everyone_including_sender() {
    // given: alice and bob registered
    let server = TestServer::start(19091).await;
    let mut alice = connect(&server.ws_url()).await;
    register(&mut alice, "alice").await;
    recv_json(&mut alice).await;
    let mut bob = connect(&server.ws_url()).await;
    register(&mut bob, "bob").await;
    recv_json(&mut alice).await;
    recv_json(&mut bob).await;

    // when: alice sends a chat message
    send_json(
        &mut alice,
        json!({
            "type": "message",
            "sender": "alice",
            "text": "hi",
            "timestamp": 1700000000000i64,
            "localId": "L1"
        }),
    )
    .await;

    // then: both receive exactly the four fields, relayed verbatim
    let expected = json!({
        "sender": "alice",
        "text": "hi",
        "timestamp": 1700000000000i64,
        "localId": "L1"
    });
    for ws in [&mut alice, &mut bob] {
        let delivered = recv_json(ws).await;
        assert_eq!(delivered, expected);
        assert_eq!(delivered.as_object().unwrap().len(), 4);
    }
}

#[tokio::test]
async fn test_duplicate_set_user_id_is_a_no_op() {
    // given: alice registered
    let server = TestServer::start(19092).await;
    let mut alice = connect(&server.ws_url()).await;
    register(&mut alice, "alice").await;
    recv_json(&mut alice).await;

    // when: alice registers again, then sends a chat message
    register(&mut alice, "alice").await;
    send_json(
        &mut alice,
        json!({"type": "message", "sender": "alice", "text": "still me", "timestamp": 1i64, "localId": "L1"}),
    )
    .await;

    // then: no second presence broadcast — the next frame is the chat echo
    let next = recv_json(&mut alice).await;
    assert_eq!(next["text"], "still me");
}

#[tokio::test]
async fn test_duplicate_user_id_keeps_original_connection() {
    // given: alice registered on her own connection
    let server = TestServer::start(19093).await;
    let mut alice = connect(&server.ws_url()).await;
    register(&mut alice, "alice").await;
    recv_json(&mut alice).await;

    // when: an impostor connection claims the same user id, then sends a
    // message
    let mut impostor = connect(&server.ws_url()).await;
    register(&mut impostor, "alice").await;
    send_json(
        &mut impostor,
        json!({"type": "message", "sender": "alice", "text": "who?", "timestamp": 2i64, "localId": null}),
    )
    .await;

    // then: the broadcast goes to the original connection only — the
    // impostor was never admitted to the registry
    assert_eq!(recv_json(&mut alice).await["text"], "who?");
    let nothing = tokio::time::timeout(Duration::from_millis(300), impostor.next()).await;
    assert!(nothing.is_err(), "unregistered connection must not receive broadcasts");
}

#[tokio::test]
async fn test_malformed_payload_is_dropped_and_connection_survives() {
    // given: alice registered
    let server = TestServer::start(19094).await;
    let mut alice = connect(&server.ws_url()).await;
    register(&mut alice, "alice").await;
    recv_json(&mut alice).await;

    // when: garbage, a payload without a type, and an unknown tag arrive
    alice
        .send(Message::Text("not json at all".into()))
        .await
        .unwrap();
    send_json(&mut alice, json!({"userId": "alice"})).await;
    send_json(&mut alice, json!({"type": "bogus"})).await;

    // ... followed by a valid message on the same connection
    send_json(
        &mut alice,
        json!({"type": "message", "sender": "alice", "text": "survived", "timestamp": 3i64, "localId": "L2"}),
    )
    .await;

    // then: the connection is still registered and broadcasting
    assert_eq!(recv_json(&mut alice).await["text"], "survived");
}

#[tokio::test]
async fn test_disconnect_shrinks_presence_snapshot() {
    // given: alice and bob registered
    let server = TestServer::start(19095).await;
    let mut alice = connect(&server.ws_url()).await;
    register(&mut alice, "alice").await;
    recv_json(&mut alice).await;
    let mut bob = connect(&server.ws_url()).await;
    register(&mut bob, "bob").await;
    recv_json(&mut alice).await;
    recv_json(&mut bob).await;

    // when: bob leaves
    bob.close(None).await.unwrap();

    // then: alice receives the shrunk snapshot
    assert_eq!(
        recv_json(&mut alice).await,
        json!({"type": "users", "users": ["alice"]})
    );
}

#[tokio::test]
async fn test_http_endpoints() {
    // given:
    let server = TestServer::start(19096).await;
    let client = reqwest::Client::new();

    // when / then: health check
    let response = client
        .get(format!("{}/api/health", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");

    // and: the user list reflects the registry
    let mut alice = connect(&server.ws_url()).await;
    register(&mut alice, "alice").await;
    recv_json(&mut alice).await;

    let response = client
        .get(format!("{}/api/users", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!(["alice"]));
}
