//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the handle used to render `/metrics`. Call once at startup,
/// before any metric is recorded.
///
/// # Panics
///
/// Panics if a global recorder is already installed.
pub fn install_recorder() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// A handle backed by a recorder that is not installed globally.
///
/// Used when the process already has a recorder, and in tests.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

/// WebSocket sessions registered (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket sessions unregistered (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Registered WebSocket sessions (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Upgrades refused (counter, labels: reason).
pub const WS_REJECTIONS_TOTAL: &str = "ws_rejections_total";
/// Session lifetime (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Broadcast frames dropped by a full or closed queue (counter).
pub const WS_BROADCAST_DROPS_TOTAL: &str = "ws_broadcast_drops_total";
/// Targeted replies dropped by a full or closed queue (counter).
pub const WS_SEND_DROPS_TOTAL: &str = "ws_send_drops_total";
/// Inbound frames that failed validation (counter).
pub const WS_PROTOCOL_ERRORS_TOTAL: &str = "ws_protocol_errors_total";
/// Dispatched actions (counter, labels: action).
pub const WS_ACTIONS_TOTAL: &str = "ws_actions_total";
/// Failed actions (counter, labels: action, error_type).
pub const WS_ACTION_ERRORS_TOTAL: &str = "ws_action_errors_total";
/// Action handler duration (histogram, labels: action).
pub const WS_ACTION_DURATION_SECONDS: &str = "ws_action_duration_seconds";
