//! Transport seam between a connection's delivery loop and the wire.
//!
//! The hub never touches sockets directly. Each [`super::Connection`] owns
//! exactly one [`Transport`] and is the only writer to it; the WebSocket
//! implementation lives in [`crate::ws::connection`].

use std::future::Future;

use axum::extract::ws::Utf8Bytes;

use crate::error::HubError;

/// One serialized event envelope.
///
/// Cloning is a reference-count bump, so every recipient of a broadcast
/// shares the same immutable bytes.
pub type Frame = Utf8Bytes;

/// Write half of a bidirectional client session.
pub trait Transport: Send + 'static {
    /// Writes one frame as a single discrete message.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::TransportWriteFailed`] if the peer is gone or the
    /// underlying write fails.
    fn send(&mut self, frame: Frame) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Sends a heartbeat probe. Transports without a native ping succeed.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::TransportWriteFailed`] if the probe cannot be written.
    fn ping(&mut self) -> impl Future<Output = Result<(), HubError>> + Send {
        async { Ok(()) }
    }

    /// Releases the transport. Called exactly once per connection.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
