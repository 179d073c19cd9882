//! WebSocket session driver.
//!
//! Splits an upgraded socket: the write half becomes the hub transport for
//! the connection's delivery loop, while this module keeps reading the
//! inbound half to notice client disconnects.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use crate::error::HubError;
use crate::hub::{Broker, ConnectionHandle, Frame, Transport};

impl Transport for SplitSink<WebSocket, Message> {
    async fn send(&mut self, frame: Frame) -> Result<(), HubError> {
        SinkExt::send(self, Message::Text(frame))
            .await
            .map_err(|err| HubError::TransportWriteFailed(err.to_string()))
    }

    async fn ping(&mut self) -> Result<(), HubError> {
        SinkExt::send(self, Message::Ping(Bytes::new()))
            .await
            .map_err(|err| HubError::TransportWriteFailed(err.to_string()))
    }

    async fn close(&mut self) {
        if let Err(err) = SinkExt::close(self).await {
            tracing::debug!(error = %err, "websocket close failed");
        }
    }
}

/// Runs one upgraded WebSocket session to completion.
///
/// Registers the connection with the broker, then reads inbound frames
/// until the client goes away or the hub removes the connection.
pub async fn run_connection(socket: WebSocket, peer: SocketAddr, broker: Broker) {
    let (ws_tx, ws_rx) = socket.split();
    let handle = broker.accept(Some(peer), ws_tx).await;
    tracing::info!(conn_id = %handle.id(), %peer, "websocket connected");

    read_until_closed(ws_rx, &handle).await;

    let client_initiated = broker.registry().remove(handle.id()).await;
    tracing::info!(conn_id = %handle.id(), %peer, client_initiated, "websocket disconnected");
}

/// Drains inbound frames. Clients have nothing to say to the hub, so
/// payloads are ignored; only closure matters.
async fn read_until_closed(mut ws_rx: SplitStream<WebSocket>, handle: &ConnectionHandle) {
    loop {
        tokio::select! {
            () = handle.closing() => break,
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(
                            conn_id = %handle.id(),
                            len = text.as_str().len(),
                            "ignoring inbound text frame"
                        );
                    }
                    Some(Ok(Message::Binary(data))) => {
                        tracing::debug!(
                            conn_id = %handle.id(),
                            len = data.len(),
                            "ignoring inbound binary frame"
                        );
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(conn_id = %handle.id(), error = %err, "websocket read failed");
                        break;
                    }
                }
            }
        }
    }
}
