//! A single live connection: shared handle, outbound queue, delivery loop.
//!
//! [`Connection::new`] splits a session into two halves:
//!
//! - a [`ConnectionHandle`], cloned into the [`super::Registry`], which is the
//!   only way frames enter the outbound queue ([`ConnectionHandle::enqueue`]);
//! - the [`Connection`] itself, which owns the transport and the queue's
//!   receiving end and runs the delivery loop ([`Connection::run`]).
//!
//! The lifecycle `Active → Closing → Closed` lives in a `watch` channel so
//! the delivery loop and the inbound reader both observe removal promptly.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use utoipa::ToSchema;

use super::Registry;
use super::transport::{Frame, Transport};
use crate::config::HubSettings;
use crate::domain::ConnectionId;
use crate::error::HubError;

/// Lifecycle state of a connection. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Admitted and eligible for broadcasts.
    Active,
    /// Removed from the live set; the transport is being released.
    Closing,
    /// Transport released.
    Closed,
}

/// Result of offering a frame to a connection's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    /// The frame was queued for delivery.
    Accepted,
    /// The queue was full; the frame was dropped for this connection only.
    Saturated,
    /// The connection no longer accepts frames.
    Closed,
}

impl Enqueue {
    /// Returns `true` if the frame was queued.
    #[must_use]
    pub const fn accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

#[derive(Debug)]
struct Shared {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    connected_at: DateTime<Utc>,
    state: watch::Sender<ConnectionState>,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Cloneable handle to a connection's outbound queue and lifecycle state.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    shared: Arc<Shared>,
    outbound: mpsc::Sender<Frame>,
}

impl ConnectionHandle {
    /// Returns the connection's identity.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.shared.id
    }

    /// Returns the peer address recorded at upgrade time, if any.
    #[must_use]
    pub fn peer(&self) -> Option<SocketAddr> {
        self.shared.peer
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Returns `true` while the connection is eligible for broadcasts.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == ConnectionState::Active
    }

    /// Offers a frame to the outbound queue without waiting.
    ///
    /// A full queue drops the new frame (drop-newest) and bumps the
    /// connection's dropped counter. Never writes to the transport.
    pub fn enqueue(&self, frame: Frame) -> Enqueue {
        if !self.is_active() {
            return Enqueue::Closed;
        }
        match self.outbound.try_send(frame) {
            Ok(()) => Enqueue::Accepted,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                Enqueue::Saturated
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Enqueue::Closed,
        }
    }

    /// Number of frames waiting in the outbound queue.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.outbound
            .max_capacity()
            .saturating_sub(self.outbound.capacity())
    }

    /// Number of frames written to the transport so far.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.shared.delivered.load(Ordering::Relaxed)
    }

    /// Number of frames dropped because the queue was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Resolves once the connection has left [`ConnectionState::Active`].
    pub async fn closing(&self) {
        let mut state = self.shared.state.subscribe();
        let _ = state.wait_for(|s| *s != ConnectionState::Active).await;
    }

    /// Resolves once the transport has been released.
    pub async fn closed(&self) {
        let mut state = self.shared.state.subscribe();
        let _ = state.wait_for(|s| *s == ConnectionState::Closed).await;
    }

    /// Moves `Active → Closing`. Returns `false` if already past `Active`.
    pub(crate) fn begin_closing(&self) -> bool {
        self.shared.state.send_if_modified(|state| {
            if *state == ConnectionState::Active {
                *state = ConnectionState::Closing;
                true
            } else {
                false
            }
        })
    }

    fn mark_closed(&self) {
        self.shared.state.send_replace(ConnectionState::Closed);
    }

    /// Returns a serializable snapshot of this connection.
    #[must_use]
    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id(),
            peer: self.peer().map(|addr| addr.to_string()),
            state: self.state(),
            connected_at: self.shared.connected_at,
            queued: self.queued(),
            delivered: self.delivered(),
            dropped: self.dropped(),
        }
    }
}

/// Snapshot of a live connection for introspection endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConnectionInfo {
    /// Connection identifier.
    #[schema(value_type = String)]
    pub id: ConnectionId,
    /// Peer socket address.
    pub peer: Option<String>,
    /// Lifecycle state.
    pub state: ConnectionState,
    /// Admission timestamp.
    pub connected_at: DateTime<Utc>,
    /// Frames waiting in the outbound queue.
    pub queued: usize,
    /// Frames written to the transport.
    pub delivered: u64,
    /// Frames dropped on a full queue.
    pub dropped: u64,
}

/// Why a delivery loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    Removed,
    WriteFailed,
}

impl ExitReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Removed => "removed",
            Self::WriteFailed => "write_failed",
        }
    }
}

/// Delivery side of a connection: owns the transport and the queue receiver.
#[derive(Debug)]
pub struct Connection<T> {
    handle: ConnectionHandle,
    outbound: mpsc::Receiver<Frame>,
    transport: T,
    settings: HubSettings,
}

impl<T: Transport> Connection<T> {
    /// Builds an `Active` connection with a fresh identity and a bounded
    /// outbound queue of `settings.queue_capacity` frames.
    #[must_use]
    pub fn new(peer: Option<SocketAddr>, transport: T, settings: HubSettings) -> Self {
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
        let (state, _) = watch::channel(ConnectionState::Active);
        let shared = Arc::new(Shared {
            id: ConnectionId::generate(),
            peer,
            connected_at: Utc::now(),
            state,
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        });
        Self {
            handle: ConnectionHandle {
                shared,
                outbound: tx,
            },
            outbound: rx,
            transport,
            settings,
        }
    }

    /// Returns the handle shared with the registry.
    #[must_use]
    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Runs the delivery loop until the connection leaves `Active` or a
    /// write fails, then removes itself from `registry`, closes the
    /// transport, and marks the connection `Closed`.
    pub async fn run(mut self, registry: Arc<Registry>) {
        let id = self.handle.id();
        let reason = self.deliver().await;

        let evicted = registry.remove(id).await;
        self.transport.close().await;
        self.handle.mark_closed();

        tracing::debug!(
            conn_id = %id,
            reason = reason.as_str(),
            evicted,
            delivered = self.handle.delivered(),
            dropped = self.handle.dropped(),
            "delivery loop finished"
        );
    }

    /// Releases a connection that was never admitted: no delivery loop runs,
    /// the transport is closed once and the handle ends up `Closed`.
    pub(crate) async fn discard(mut self) {
        self.handle.begin_closing();
        self.transport.close().await;
        self.handle.mark_closed();
        tracing::debug!(conn_id = %self.handle.id(), "discarded unadmitted connection");
    }

    async fn deliver(&mut self) -> ExitReason {
        let mut heartbeat = self.settings.ping_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                biased;
                () = self.handle.closing() => return ExitReason::Removed,
                frame = self.outbound.recv() => {
                    let Some(frame) = frame else {
                        return ExitReason::Removed;
                    };
                    tokio::select! {
                        biased;
                        () = self.handle.closing() => return ExitReason::Removed,
                        result = write_frame(&mut self.transport, frame, &self.settings) => {
                            if let Err(err) = result {
                                tracing::warn!(
                                    conn_id = %self.handle.id(),
                                    error = %err,
                                    "dropping connection after failed write"
                                );
                                return ExitReason::WriteFailed;
                            }
                            self.handle.shared.delivered.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                () = tick(&mut heartbeat) => {
                    tokio::select! {
                        biased;
                        () = self.handle.closing() => return ExitReason::Removed,
                        result = ping(&mut self.transport, &self.settings) => {
                            if let Err(err) = result {
                                tracing::warn!(
                                    conn_id = %self.handle.id(),
                                    error = %err,
                                    "dropping connection after failed heartbeat"
                                );
                                return ExitReason::WriteFailed;
                            }
                        }
                    }
                }
            }
        }
    }
}

async fn write_frame<T: Transport>(
    transport: &mut T,
    frame: Frame,
    settings: &HubSettings,
) -> Result<(), HubError> {
    tokio::time::timeout(settings.write_timeout, transport.send(frame))
        .await
        .unwrap_or_else(|_| {
            Err(HubError::TransportWriteFailed(format!(
                "write timed out after {:?}",
                settings.write_timeout
            )))
        })
}

async fn ping<T: Transport>(transport: &mut T, settings: &HubSettings) -> Result<(), HubError> {
    tokio::time::timeout(settings.write_timeout, transport.ping())
        .await
        .unwrap_or_else(|_| {
            Err(HubError::TransportWriteFailed(format!(
                "ping timed out after {:?}",
                settings.write_timeout
            )))
        })
}

async fn tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
