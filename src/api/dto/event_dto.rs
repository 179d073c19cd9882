//! Event publishing DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::HubError;
use crate::hub::BroadcastOutcome;

/// Longest accepted event type tag.
pub const MAX_EVENT_TYPE_LEN: usize = 64;

/// Request body for `POST /api/v1/events`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishEventRequest {
    /// Event kind tag (e.g. `"post_created"`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Arbitrary JSON payload forwarded verbatim to every client.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
}

impl PublishEventRequest {
    /// Returns the trimmed event type.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidRequest`] if the type is blank or longer
    /// than [`MAX_EVENT_TYPE_LEN`] bytes.
    pub fn validated_type(&self) -> Result<&str, HubError> {
        let event_type = self.event_type.trim();
        if event_type.is_empty() {
            return Err(HubError::InvalidRequest("event type must not be empty".to_string()));
        }
        if event_type.len() > MAX_EVENT_TYPE_LEN {
            return Err(HubError::InvalidRequest(format!(
                "event type exceeds {MAX_EVENT_TYPE_LEN} bytes"
            )));
        }
        Ok(event_type)
    }
}

/// Response body for `POST /api/v1/events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublishEventResponse {
    /// Event kind tag that was published.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Fan-out counts at publish time.
    pub outcome: BroadcastOutcome,
    /// Publish timestamp.
    pub published_at: DateTime<Utc>,
}
