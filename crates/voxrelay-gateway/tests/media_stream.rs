// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media-stream websocket calls against a live listener.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use voxrelay_core::RelayError;
use voxrelay_gateway::{serve, AppState};

use common::{ScriptedGateway, TIMEOUT};

type Phone = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

struct Server {
    addr: SocketAddr,
    state: AppState,
    shutdown: CancellationToken,
    task: JoinHandle<Result<(), RelayError>>,
}

async fn start(state: AppState) -> Server {
    let shutdown = CancellationToken::new();
    let state = state.with_shutdown(shutdown.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(serve(listener, state.clone()));
    Server {
        addr,
        state,
        shutdown,
        task,
    }
}

async fn dial(server: &Server, tenant: &str) -> Phone {
    let url = format!("ws://{}/media-stream/{tenant}", server.addr);
    let (phone, _) = connect_async(url).await.unwrap();
    phone
}

async fn send(phone: &mut Phone, event: Value) {
    phone.send(Message::Text(event.to_string().into())).await.unwrap();
}

async fn next_json(phone: &mut Phone) -> Value {
    loop {
        let message = tokio::time::timeout(TIMEOUT, phone.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn wait_for_no_calls(state: &AppState) {
    tokio::time::timeout(TIMEOUT, async {
        while !state.calls.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn call_is_bridged_to_the_gateway() {
    let (connector, mut peers) = ScriptedGateway::new();
    let server = start(common::state(connector)).await;

    let mut phone = dial(&server, "acme").await;
    let mut peer = tokio::time::timeout(TIMEOUT, peers.recv())
        .await
        .unwrap()
        .unwrap();

    let update = peer.next_json().await.unwrap();
    assert_eq!(update["type"], "session.update");
    assert_eq!(update["session"]["instructions"], "You sell cars.");

    send(&mut phone, json!({"event": "connected", "protocol": "Call"})).await;
    send(&mut phone, json!({"event": "start", "start": {"streamSid": "MZ1"}})).await;
    send(
        &mut phone,
        json!({"event": "media", "media": {"timestamp": "20", "payload": "AAEC"}}),
    )
    .await;
    assert_eq!(
        peer.next_json().await.unwrap(),
        json!({"type": "input_audio_buffer.append", "audio": "AAEC"})
    );
    assert_eq!(server.state.calls.len(), 1);

    peer.send(json!({"type": "response.audio.delta", "item_id": "item_1", "delta": "UklG"}));
    assert_eq!(
        next_json(&mut phone).await,
        json!({"event": "media", "streamSid": "MZ1", "media": {"payload": "UklG"}})
    );
    assert_eq!(
        next_json(&mut phone).await,
        json!({"event": "mark", "streamSid": "MZ1", "mark": {"name": "responsePart"}})
    );

    // Hanging up closes the gateway side too.
    phone.close(None).await.unwrap();
    assert_eq!(
        tokio::time::timeout(TIMEOUT, peer.outbox.recv()).await.unwrap(),
        None
    );
    wait_for_no_calls(&server.state).await;

    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn unknown_tenant_is_refused_before_upgrade() {
    let (connector, _peers) = ScriptedGateway::new();
    let server = start(common::state(connector)).await;

    let url = format!("ws://{}/media-stream/initech", server.addr);
    match connect_async(url).await {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), 404);
        }
        Err(e) => panic!("expected a 404 handshake failure, got {e}"),
        Ok(_) => panic!("handshake for an unknown tenant succeeded"),
    }
    server.shutdown.cancel();
}

#[tokio::test]
async fn unreachable_gateway_hangs_up_the_stream() {
    let server = start(common::state(ScriptedGateway::unreachable())).await;

    let mut phone = dial(&server, "acme").await;
    let ended = tokio::time::timeout(TIMEOUT, phone.next()).await.unwrap();
    assert!(matches!(
        ended,
        None | Some(Err(_)) | Some(Ok(Message::Close(_)))
    ));
    assert!(server.state.calls.is_empty());
    server.shutdown.cancel();
}

#[tokio::test]
async fn shutdown_ends_live_calls() {
    let (connector, mut peers) = ScriptedGateway::new();
    let server = start(common::state(connector)).await;

    let _phone = dial(&server, "globex").await;
    let mut peer = tokio::time::timeout(TIMEOUT, peers.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(peer.next_json().await.unwrap()["session"]["voice"], "verse");

    server.shutdown.cancel();
    assert_eq!(
        tokio::time::timeout(TIMEOUT, peer.outbox.recv()).await.unwrap(),
        None
    );
    wait_for_no_calls(&server.state).await;
    server.task.await.unwrap().unwrap();
}
