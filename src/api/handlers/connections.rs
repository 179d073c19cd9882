//! Connection introspection and server-initiated disconnect.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::dto::ConnectionListResponse;
use crate::app_state::AppState;
use crate::domain::ConnectionId;
use crate::error::{ErrorResponse, HubError};

/// `GET /connections` — List live connections.
#[utoipa::path(
    get,
    path = "/api/v1/connections",
    tag = "Connections",
    summary = "List live connections",
    responses(
        (status = 200, description = "Live set snapshot", body = ConnectionListResponse),
    )
)]
pub async fn list_connections(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.broker.registry().snapshot().await;
    Json(ConnectionListResponse::from(snapshot))
}

/// `DELETE /connections/{id}` — Disconnect a live connection.
///
/// # Errors
///
/// Returns [`HubError::ConnectionNotFound`] if the connection is not live.
#[utoipa::path(
    delete,
    path = "/api/v1/connections/{id}",
    tag = "Connections",
    summary = "Disconnect a client",
    params(("id" = String, Path, description = "Connection identifier")),
    responses(
        (status = 204, description = "Connection removed"),
        (status = 404, description = "No such live connection", body = ErrorResponse),
    )
)]
pub async fn disconnect(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, HubError> {
    state
        .broker
        .disconnect(ConnectionId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Connection routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/connections", get(list_connections))
        .route("/connections/{id}", delete(disconnect))
}
