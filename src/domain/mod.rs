//! Domain layer: connection identity, post payloads, and hub events.
//!
//! These types are shared by the hub core, the WebSocket layer, and the
//! REST endpoints. None of them perform I/O.

pub mod connection_id;
pub mod event;
pub mod post;

pub use connection_id::ConnectionId;
pub use event::{EventEnvelope, HubEvent};
pub use post::Post;
