//! WebSocket session state, registry, presence, and message handling.

pub mod connection;
pub mod handler;
pub mod presence;
pub mod registry;
pub mod session;
