//! The live set of admitted connections.
//!
//! [`Registry`] is the only component that reads or writes the live set.
//! Admission, removal, and broadcast enumeration all run while holding one
//! [`tokio::sync::Mutex`], so a fan-out always sees a consistent snapshot and
//! removal can never interleave with an in-progress broadcast.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::Mutex;
use utoipa::ToSchema;

use super::connection::{ConnectionHandle, ConnectionInfo, Enqueue};
use super::transport::Frame;
use crate::domain::ConnectionId;
use crate::error::HubError;

/// Per-broadcast delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BroadcastOutcome {
    /// Connections whose queue accepted the frame.
    pub delivered: usize,
    /// Connections whose queue was full; the frame was dropped for them.
    pub saturated: usize,
    /// Connections found closed during the fan-out and pruned.
    pub pruned: usize,
}

/// Authoritative set of `Active` connections.
///
/// # Concurrency
///
/// - `admit`, `remove`, and `broadcast` are mutually exclusive.
/// - `broadcast` holds the lock for the whole enumeration but never waits
///   on a connection: each enqueue is a non-blocking `try_send`.
/// - Because broadcasts are totally ordered by lock acquisition, every
///   connection receives frames in the same order they were published.
#[derive(Debug, Default)]
pub struct Registry {
    live: Mutex<HashMap<ConnectionId, ConnectionHandle>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a newly built connection to the live set.
    ///
    /// Returns `false` (and leaves the set untouched) if the connection is
    /// no longer `Active` or its identity is already present. Admitting the
    /// same connection twice is a caller bug and trips a debug assertion.
    #[must_use]
    pub async fn admit(&self, handle: ConnectionHandle) -> bool {
        let id = handle.id();
        let mut live = self.live.lock().await;
        debug_assert!(!live.contains_key(&id), "connection {id} admitted twice");
        if live.contains_key(&id) {
            tracing::warn!(conn_id = %id, "ignoring duplicate admission");
            return false;
        }
        if !handle.is_active() {
            tracing::warn!(conn_id = %id, state = ?handle.state(), "refusing to admit inactive connection");
            return false;
        }
        live.insert(id, handle);
        tracing::info!(conn_id = %id, live = live.len(), "connection admitted");
        true
    }

    /// Removes a connection and signals its delivery loop to release the
    /// transport.
    ///
    /// Idempotent: returns `false` if the connection is already gone.
    #[must_use]
    pub async fn remove(&self, id: ConnectionId) -> bool {
        let mut live = self.live.lock().await;
        let Some(handle) = live.remove(&id) else {
            return false;
        };
        handle.begin_closing();
        tracing::info!(conn_id = %id, live = live.len(), "connection removed");
        true
    }

    /// Offers the same frame to every live connection's outbound queue.
    ///
    /// Never waits on a slow connection. A full queue drops the frame for
    /// that connection only; a connection whose delivery loop has already
    /// gone is pruned from the live set in the same critical section.
    pub async fn broadcast(&self, frame: &Frame) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        let mut live = self.live.lock().await;
        live.retain(|id, handle| match handle.enqueue(frame.clone()) {
            Enqueue::Accepted => {
                outcome.delivered += 1;
                true
            }
            Enqueue::Saturated => {
                outcome.saturated += 1;
                let err = HubError::QueueSaturated(*id);
                tracing::warn!(
                    conn_id = %id,
                    dropped = handle.dropped(),
                    error = %err,
                    "dropping event for slow connection"
                );
                true
            }
            Enqueue::Closed => {
                outcome.pruned += 1;
                handle.begin_closing();
                tracing::debug!(conn_id = %id, "pruning closed connection");
                false
            }
        });
        outcome
    }

    /// Returns `true` if the connection is in the live set.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.live.lock().await.contains_key(&id)
    }

    /// Returns snapshots of all live connections.
    pub async fn snapshot(&self) -> Vec<ConnectionInfo> {
        let live = self.live.lock().await;
        live.values().map(ConnectionHandle::info).collect()
    }

    /// Returns the number of live connections.
    pub async fn len(&self) -> usize {
        self.live.lock().await.len()
    }

    /// Returns `true` if no connection is live.
    pub async fn is_empty(&self) -> bool {
        self.live.lock().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::config::HubSettings;
    use crate::hub::Connection;
    use crate::hub::transport::testing::{MemoryTransport, memory_transport};

    fn make_connection(capacity: usize) -> Connection<MemoryTransport> {
        let (transport, _peer) = memory_transport();
        let settings = HubSettings::default()
            .with_queue_capacity(capacity)
            .with_ping_interval(None);
        Connection::new(None, transport, settings)
    }

    fn frame(text: &str) -> Frame {
        Frame::from(text.to_string())
    }

    #[tokio::test]
    async fn admit_and_contains() {
        let registry = Registry::new();
        let conn = make_connection(4);
        let id = conn.handle().id();

        assert!(registry.admit(conn.handle().clone()).await);
        assert!(registry.contains(id).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn inactive_connection_is_refused() {
        let registry = Registry::new();
        let conn = make_connection(4);
        conn.handle().begin_closing();

        assert!(!registry.admit(conn.handle().clone()).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = Registry::new();
        let conn = make_connection(4);
        let id = conn.handle().id();
        assert!(registry.admit(conn.handle().clone()).await);

        assert!(registry.remove(id).await);
        assert!(!registry.remove(id).await);
        assert!(!registry.remove(ConnectionId::generate()).await);
        assert!(registry.is_empty().await);
        assert!(!conn.handle().is_active());
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connection_once() {
        let registry = Registry::new();
        let conns: Vec<_> = (0..3).map(|_| make_connection(4)).collect();
        for conn in &conns {
            assert!(registry.admit(conn.handle().clone()).await);
        }

        let outcome = registry.broadcast(&frame("hello")).await;
        assert_eq!(outcome.delivered, 3);
        for conn in &conns {
            assert_eq!(conn.handle().queued(), 1);
        }
    }

    #[tokio::test]
    async fn removed_connection_gets_no_broadcast() {
        let registry = Registry::new();
        let kept = make_connection(4);
        let gone = make_connection(4);
        assert!(registry.admit(kept.handle().clone()).await);
        assert!(registry.admit(gone.handle().clone()).await);

        assert!(registry.remove(gone.handle().id()).await);
        let outcome = registry.broadcast(&frame("after removal")).await;

        assert_eq!(outcome.delivered, 1);
        assert_eq!(kept.handle().queued(), 1);
        assert_eq!(gone.handle().queued(), 0);
    }

    #[tokio::test]
    async fn saturated_queue_holds_exactly_capacity() {
        const CAPACITY: usize = 8;
        let registry = Registry::new();
        let stalled = make_connection(CAPACITY);
        assert!(registry.admit(stalled.handle().clone()).await);

        let mut saturated = 0;
        for n in 0..CAPACITY + 5 {
            saturated += registry.broadcast(&frame(&n.to_string())).await.saturated;
        }

        assert_eq!(saturated, 5);
        assert_eq!(stalled.handle().queued(), CAPACITY);
        assert_eq!(stalled.handle().dropped(), 5);
        assert!(registry.contains(stalled.handle().id()).await);
    }

    #[tokio::test]
    async fn closed_queue_is_pruned() {
        let registry = Registry::new();
        let conn = make_connection(4);
        let handle = conn.handle().clone();
        assert!(registry.admit(handle.clone()).await);
        drop(conn);

        let outcome = registry.broadcast(&frame("orphaned")).await;
        assert_eq!(outcome.pruned, 1);
        assert!(registry.is_empty().await);
        assert!(!handle.is_active());
    }

    #[tokio::test]
    async fn concurrent_admit_and_broadcast_never_duplicates() {
        let registry = Arc::new(Registry::new());
        let conns: Vec<_> = (0..32).map(|_| make_connection(64)).collect();

        let mut tasks = Vec::new();
        for conn in &conns {
            let registry = Arc::clone(&registry);
            let handle = conn.handle().clone();
            tasks.push(tokio::spawn(async move { registry.admit(handle).await }));
        }
        for n in 0..16 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                registry.broadcast(&frame(&n.to_string())).await;
                true
            }));
        }
        for task in tasks {
            let Ok(ok) = task.await else {
                panic!("task panicked");
            };
            assert!(ok);
        }

        let snapshot = registry.snapshot().await;
        let ids: HashSet<_> = snapshot.iter().map(|info| info.id).collect();
        assert_eq!(snapshot.len(), 32);
        assert_eq!(ids.len(), 32);
        for conn in &conns {
            assert!(conn.handle().queued() <= 16);
        }
    }

    #[tokio::test]
    async fn concurrent_remove_and_broadcast_leaves_consistent_set() {
        let registry = Arc::new(Registry::new());
        let conns: Vec<_> = (0..20).map(|_| make_connection(64)).collect();
        for conn in &conns {
            assert!(registry.admit(conn.handle().clone()).await);
        }

        let mut tasks = Vec::new();
        for conn in conns.iter().step_by(2) {
            let registry = Arc::clone(&registry);
            let id = conn.handle().id();
            tasks.push(tokio::spawn(async move {
                assert!(registry.remove(id).await);
            }));
        }
        for n in 0..10 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                registry.broadcast(&frame(&n.to_string())).await;
            }));
        }
        for task in tasks {
            assert!(task.await.is_ok());
        }

        assert_eq!(registry.len().await, 10);
        for (n, conn) in conns.iter().enumerate() {
            let handle = conn.handle();
            assert_eq!(registry.contains(handle.id()).await, n % 2 == 1);
            assert_eq!(handle.is_active(), n % 2 == 1);
        }
    }
}
