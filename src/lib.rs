//! # posts-hub
//!
//! Real-time connection hub for the posts service.
//!
//! Clients open a WebSocket at `/ws` and receive every domain event (e.g.
//! `post_created`) as a `{"type": ..., "payload": ...}` JSON frame. Use cases
//! publish through [`hub::Broker`]; a slow or dead client never stalls the
//! publisher or any other client.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket)          Use cases / REST
//!     │                              │
//!     ├── WS Handler (ws/)           ├── Publish handler (api/)
//!     │                              │
//!     └──────────► Broker (hub/) ◄───┘
//!                     │
//!                 Registry (hub/)  ── one lock for admit / remove / fan-out
//!                     │
//!        Connection delivery loops (hub/), one per client
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod ws;
