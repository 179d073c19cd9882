//! Domain events broadcast to every live connection.
//!
//! Use cases emit a [`HubEvent`] after a successful state change. The broker
//! wraps it into an [`EventEnvelope`] (`{"type": ..., "payload": ...}`) and
//! serializes it exactly once; all recipients share the resulting bytes.

use serde::{Deserialize, Serialize};

use super::Post;

/// Event kind tag for a newly created post.
pub const POST_CREATED: &str = "post_created";
/// Event kind tag for an updated post.
pub const POST_UPDATED: &str = "post_updated";
/// Event kind tag for a deleted post.
pub const POST_DELETED: &str = "post_deleted";

/// Wire envelope for a single broadcast event.
///
/// ```json
/// { "type": "post_created", "payload": { "id": "p1", ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<P = serde_json::Value> {
    /// Short tag identifying the event kind.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event-specific payload.
    pub payload: P,
}

impl<P: Serialize> EventEnvelope<P> {
    /// Wraps a payload under the given event type.
    pub fn new(event_type: impl Into<String>, payload: P) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// Serializes the envelope to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the payload cannot be serialized
    /// (e.g. a map with non-string keys).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Closed set of events the posts use cases publish through the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    /// A post was created.
    PostCreated(Post),
    /// A post was updated.
    PostUpdated(Post),
    /// A post was deleted.
    PostDeleted {
        /// Identifier of the deleted post.
        id: String,
        /// Identifier of the post's author.
        author_id: String,
    },
}

/// Payload shape for [`HubEvent::PostDeleted`].
#[derive(Debug, Serialize)]
struct DeletedPost<'a> {
    id: &'a str,
    author_id: &'a str,
}

impl HubEvent {
    /// Returns the event type tag used on the wire.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PostCreated(_) => POST_CREATED,
            Self::PostUpdated(_) => POST_UPDATED,
            Self::PostDeleted { .. } => POST_DELETED,
        }
    }

    /// Serializes the event as an [`EventEnvelope`] JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the payload fails to serialize.
    pub fn to_envelope_json(&self) -> Result<String, serde_json::Error> {
        let event_type = self.event_type_str();
        match self {
            Self::PostCreated(post) | Self::PostUpdated(post) => {
                EventEnvelope::new(event_type, post).to_json()
            }
            Self::PostDeleted { id, author_id } => EventEnvelope::new(
                event_type,
                DeletedPost {
                    id: id.as_str(),
                    author_id: author_id.as_str(),
                },
            )
            .to_json(),
        }
    }
}
