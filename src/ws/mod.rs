//! WebSocket layer: upgrade endpoint and per-session driver.
//!
//! The endpoint at `/ws` is push-only: every connected client receives
//! every published event as one JSON text frame.

pub mod connection;
pub mod handler;
