//! Post payload carried by post lifecycle events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A post as returned by the posts use cases after a successful write.
///
/// The hub never validates or mutates posts; it only serializes them into
/// event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Post {
    /// Post identifier (UUID string assigned by the posts service).
    pub id: String,
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
    /// Identifier of the authoring user.
    pub author_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp, if the post was deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Creates a fresh, never-updated post.
    #[must_use]
    pub fn new(id: String, title: String, content: String, author_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            content,
            author_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
