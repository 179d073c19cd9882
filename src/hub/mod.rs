//! Real-time connection hub: admission, live set, and broadcast fan-out.
//!
//! ```text
//! Broker::publish ──► Registry::broadcast ──► ConnectionHandle::enqueue (try_send)
//!                                                   │
//!                                  per-connection bounded queue
//!                                                   │
//!                             Connection::run ──► Transport::send
//! ```
//!
//! Full-queue policy is drop-newest: the saturated connection misses that
//! event, stays live, and the publisher never waits.

pub mod broker;
pub mod connection;
pub mod registry;
pub mod transport;

pub use broker::{Broker, EventPublisher};
pub use connection::{Connection, ConnectionHandle, ConnectionInfo, ConnectionState, Enqueue};
pub use registry::{BroadcastOutcome, Registry};
pub use transport::{Frame, Transport};
