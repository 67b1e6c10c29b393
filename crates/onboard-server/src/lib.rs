//! # onboard-server
//!
//! Axum HTTP + `WebSocket` server for the onboarding backend.
//!
//! - `/ws/client`: one realtime session per client UUID
//! - [`websocket::registry::ConnectionRegistry`]: who is online, targeted
//!   send and fan-out broadcast
//! - [`websocket::presence`]: `server_stats` after every connect/disconnect
//! - [`actions`]: inbound envelopes dispatched by `action`
//! - `/health`, `/metrics`, graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod actions;
pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod websocket;
