//! Connection introspection DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::hub::ConnectionInfo;

/// Response body for `GET /api/v1/connections`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectionListResponse {
    /// Number of live connections.
    pub count: usize,
    /// One entry per live connection.
    pub connections: Vec<ConnectionInfo>,
}

impl From<Vec<ConnectionInfo>> for ConnectionListResponse {
    fn from(connections: Vec<ConnectionInfo>) -> Self {
        Self {
            count: connections.len(),
            connections,
        }
    }
}
