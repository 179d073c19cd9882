//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::HubError;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// A request that is not a valid upgrade gets `400` and nothing is
/// registered. Registration happens only inside the upgrade callback, so an
/// upgrade that fails after the response is never admitted either.
///
/// # Errors
///
/// Returns [`HubError::UpgradeFailed`] if the request cannot be upgraded.
pub async fn ws_handler(
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, HubError> {
    let ws = upgrade.map_err(|rejection| {
        tracing::warn!(%peer, error = %rejection, "rejected websocket upgrade");
        HubError::UpgradeFailed(rejection.body_text())
    })?;
    let broker = state.broker.clone();

    Ok(ws
        .on_failed_upgrade(move |err| {
            tracing::warn!(%peer, error = %err, "websocket upgrade failed");
        })
        .on_upgrade(move |socket| run_connection(socket, peer, broker)))
}
