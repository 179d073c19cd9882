//! Public entry points of the hub.
//!
//! [`Broker`] is the only hub type the rest of the service touches: the
//! WebSocket handler calls [`Broker::accept`] after an upgrade, and use cases
//! publish through [`Broker::publish`] (or the [`EventPublisher`] seam).
//! Publishing is fire-and-forget: per-connection delivery failures are never
//! visible to the caller.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;

use super::connection::{Connection, ConnectionHandle};
use super::registry::{BroadcastOutcome, Registry};
use super::transport::{Frame, Transport};
use crate::config::HubSettings;
use crate::domain::{ConnectionId, EventEnvelope, HubEvent};
use crate::error::HubError;

/// Publishing seam consumed by the use-case layer.
pub trait EventPublisher: Send + Sync {
    /// Broadcasts an event to every live connection. Never fails.
    fn publish(&self, event: HubEvent) -> impl Future<Output = ()> + Send;
}

/// Connection hub façade. Cheap to clone; store it in application state.
#[derive(Debug, Clone)]
pub struct Broker {
    registry: Arc<Registry>,
    settings: HubSettings,
}

impl Broker {
    /// Creates a broker with an empty registry.
    #[must_use]
    pub fn new(settings: HubSettings) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            settings,
        }
    }

    /// Returns the registry backing this broker.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Registers an upgraded transport and starts its delivery loop.
    ///
    /// Admission and loop start happen together, so a connection is either
    /// fully live or not at all. If the registry refuses it, the transport is
    /// closed at once and the returned handle is already `Closed`.
    pub async fn accept<T: Transport>(
        &self,
        peer: Option<SocketAddr>,
        transport: T,
    ) -> ConnectionHandle {
        self.start(Connection::new(peer, transport, self.settings))
            .await
    }

    async fn start<T: Transport>(&self, connection: Connection<T>) -> ConnectionHandle {
        let handle = connection.handle().clone();
        if self.registry.admit(handle.clone()).await {
            tokio::spawn(connection.run(Arc::clone(&self.registry)));
        } else {
            connection.discard().await;
        }
        handle
    }

    /// Serializes a domain event once and fans it out.
    pub async fn publish(&self, event: &HubEvent) -> BroadcastOutcome {
        self.broadcast_json(event.event_type_str(), event.to_envelope_json())
            .await
    }

    /// Publishes an arbitrary serializable payload under `event_type`.
    pub async fn publish_raw<P: Serialize + ?Sized>(
        &self,
        event_type: &str,
        payload: &P,
    ) -> BroadcastOutcome {
        let json = EventEnvelope::new(event_type, payload).to_json();
        self.broadcast_json(event_type, json).await
    }

    /// Removes a live connection on behalf of the server.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::ConnectionNotFound`] if the connection is not in
    /// the live set.
    pub async fn disconnect(&self, id: ConnectionId) -> Result<(), HubError> {
        if self.registry.remove(id).await {
            Ok(())
        } else {
            Err(HubError::ConnectionNotFound(id))
        }
    }

    async fn broadcast_json(
        &self,
        event_type: &str,
        json: Result<String, serde_json::Error>,
    ) -> BroadcastOutcome {
        let json = match json {
            Ok(json) => json,
            Err(err) => {
                let err = HubError::from(err);
                tracing::error!(event_type, error = %err, "failed to serialize event");
                return BroadcastOutcome::default();
            }
        };
        let outcome = self.registry.broadcast(&Frame::from(json)).await;
        tracing::debug!(
            event_type,
            delivered = outcome.delivered,
            saturated = outcome.saturated,
            pruned = outcome.pruned,
            "event published"
        );
        outcome
    }
}

impl EventPublisher for Broker {
    async fn publish(&self, event: HubEvent) {
        let _ = Broker::publish(self, &event).await;
    }
}
