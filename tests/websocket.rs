//! End-to-end tests: real HTTP server, real WebSocket clients.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use posts_hub::api::build_app;
use posts_hub::app_state::AppState;
use posts_hub::config::HubSettings;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> SocketAddr {
    spawn_server_with(true).await
}

async fn spawn_server_with(admin_api: bool) -> SocketAddr {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    let app = build_app(
        AppState::new(HubSettings::default().with_ping_interval(None)),
        admin_api,
    );
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let Ok((client, _)) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await else {
        panic!("websocket handshake failed");
    };
    client
}

async fn live_connections(addr: SocketAddr) -> u64 {
    let Ok(response) = reqwest::get(format!("http://{addr}/health")).await else {
        panic!("health request failed");
    };
    let Ok(body) = response.json::<serde_json::Value>().await else {
        panic!("health body is not JSON");
    };
    body.get("connections")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or_default()
}

/// Registration finishes asynchronously after the handshake.
async fn wait_for_connections(addr: SocketAddr, expected: u64) {
    for _ in 0..100 {
        if live_connections(addr).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {expected} live connections");
}

async fn publish(addr: SocketAddr, body: serde_json::Value) -> reqwest::StatusCode {
    let Ok(response) = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/events"))
        .json(&body)
        .send()
        .await
    else {
        panic!("publish request failed");
    };
    response.status()
}

async fn next_event(client: &mut Client) -> serde_json::Value {
    loop {
        let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_secs(2), client.next()).await
        else {
            panic!("no event received");
        };
        if let Message::Text(text) = msg {
            let Ok(value) = serde_json::from_str(text.as_str()) else {
                panic!("event is not JSON");
            };
            return value;
        }
    }
}

#[tokio::test]
async fn every_client_receives_published_event_once() {
    let addr = spawn_server().await;
    let mut clients = Vec::new();
    for _ in 0..3 {
        clients.push(connect(addr).await);
    }
    wait_for_connections(addr, 3).await;

    let status = publish(
        addr,
        serde_json::json!({"type": "post_created", "payload": {"id": "p1"}}),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::ACCEPTED);

    for client in &mut clients {
        let event = next_event(client).await;
        assert_eq!(event.pointer("/type"), Some(&serde_json::json!("post_created")));
        assert_eq!(event.pointer("/payload/id"), Some(&serde_json::json!("p1")));
        let extra = tokio::time::timeout(Duration::from_millis(100), client.next()).await;
        assert!(extra.is_err(), "received a duplicate event");
    }
}

#[tokio::test]
async fn closed_client_leaves_live_set() {
    let addr = spawn_server().await;
    let mut leaving = connect(addr).await;
    let mut staying = connect(addr).await;
    wait_for_connections(addr, 2).await;

    assert!(leaving.send(Message::Close(None)).await.is_ok());
    wait_for_connections(addr, 1).await;

    publish(addr, serde_json::json!({"type": "post_created", "payload": {"id": "p2"}})).await;
    let event = next_event(&mut staying).await;
    assert_eq!(event.pointer("/payload/id"), Some(&serde_json::json!("p2")));
}

#[tokio::test]
async fn server_disconnect_closes_client() {
    let addr = spawn_server().await;
    let mut client = connect(addr).await;
    wait_for_connections(addr, 1).await;

    let Ok(response) = reqwest::get(format!("http://{addr}/api/v1/connections")).await else {
        panic!("list request failed");
    };
    let Ok(body) = response.json::<serde_json::Value>().await else {
        panic!("list body is not JSON");
    };
    let Some(id) = body.pointer("/connections/0/id").and_then(serde_json::Value::as_str) else {
        panic!("no connection listed: {body}");
    };

    let Ok(response) = reqwest::Client::new()
        .delete(format!("http://{addr}/api/v1/connections/{id}"))
        .send()
        .await
    else {
        panic!("delete request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);

    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(Ok(msg)) = client.next().await {
            if msg.is_close() {
                break;
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "client was not closed");
    wait_for_connections(addr, 0).await;
}

#[tokio::test]
async fn plain_get_is_rejected_without_registration() {
    let addr = spawn_server().await;

    let Ok(response) = reqwest::get(format!("http://{addr}/ws")).await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let Ok(body) = response.json::<serde_json::Value>().await else {
        panic!("error body is not JSON");
    };
    assert_eq!(body.pointer("/error/code"), Some(&serde_json::json!(1001)));
    assert_eq!(live_connections(addr).await, 0);
}

#[tokio::test]
async fn blank_event_type_is_rejected() {
    let addr = spawn_server().await;
    let status = publish(addr, serde_json::json!({"type": "  ", "payload": {}})).await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clients_cannot_publish_without_admin_api() {
    let addr = spawn_server_with(false).await;
    let mut client = connect(addr).await;
    wait_for_connections(addr, 1).await;

    let status = publish(
        addr,
        serde_json::json!({"type": "post_created", "payload": {"id": "forged"}}),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);

    let quiet = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    assert!(quiet.is_err(), "client received a frame");
}
