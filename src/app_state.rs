//! Shared application state injected into all Axum handlers.

use chrono::{DateTime, Utc};

use crate::config::HubSettings;
use crate::hub::Broker;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection hub for upgrades and event fan-out.
    pub broker: Broker,
    /// Process start time, reported by the health endpoint.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates application state around a fresh broker.
    #[must_use]
    pub fn new(settings: HubSettings) -> Self {
        Self {
            broker: Broker::new(settings),
            started_at: Utc::now(),
        }
    }
}
