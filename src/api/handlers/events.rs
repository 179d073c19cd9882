//! Event publishing endpoint for out-of-process use cases.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{PublishEventRequest, PublishEventResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, HubError};

/// `POST /events` — Broadcast an event to every connected client.
///
/// # Errors
///
/// Returns [`HubError::InvalidRequest`] if the event type is blank or too long.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Publish an event",
    description = "Wraps the payload in a `{type, payload}` envelope and fans it out to every live WebSocket connection. Delivery is best-effort.",
    request_body = PublishEventRequest,
    responses(
        (status = 202, description = "Event accepted for fan-out", body = PublishEventResponse),
        (status = 400, description = "Invalid event", body = ErrorResponse),
    )
)]
pub async fn publish_event(
    State(state): State<AppState>,
    Json(req): Json<PublishEventRequest>,
) -> Result<impl IntoResponse, HubError> {
    let event_type = req.validated_type()?;
    let outcome = state.broker.publish_raw(event_type, &req.payload).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(PublishEventResponse {
            event_type: event_type.to_string(),
            outcome,
            published_at: Utc::now(),
        }),
    ))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", post(publish_event))
}
