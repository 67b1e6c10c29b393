//! Server configuration.

use std::time::Duration;

use onboard_settings::ServerSettings;
use serde::{Deserialize, Serialize};

/// Runtime configuration for [`crate::server::OnboardServer`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Maximum registered websocket sessions.
    pub max_connections: usize,
    /// Max inbound websocket message size in bytes.
    pub max_message_size: usize,
    /// Outbound queue depth per session.
    pub send_queue_capacity: usize,
    /// Require a bearer token with the `websockets` scope on upgrade.
    pub require_auth: bool,
    /// Allowed CORS origins; empty allows any.
    pub origins: Vec<String>,
    /// Interval between server-initiated Ping frames, in seconds.
    pub ping_interval_secs: u64,
    /// Upper bound on a single action handler.
    pub handler_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 1024,
            max_message_size: 64 * 1024,
            send_queue_capacity: 256,
            require_auth: true,
            origins: Vec::new(),
            ping_interval_secs: 30,
            handler_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Build from loaded settings.
    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            max_connections: settings.max_connections,
            max_message_size: settings.max_message_size,
            send_queue_capacity: settings.send_queue_capacity.max(1),
            require_auth: settings.require_auth,
            origins: settings.origins.clone(),
            ping_interval_secs: settings.ping_interval_secs,
            handler_timeout_secs: settings.handler_timeout_secs,
        }
    }

    /// Ping interval as a [`Duration`].
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }

    /// Handler timeout as a [`Duration`].
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 0);
        assert!(cfg.require_auth);
        assert_eq!(cfg.send_queue_capacity, 256);
        assert_eq!(cfg.ping_interval(), Duration::from_secs(30));
    }

    #[test]
    fn from_settings_copies_network_fields() {
        let settings = ServerSettings {
            host: "0.0.0.0".into(),
            port: 8000,
            max_connections: 3,
            require_auth: false,
            origins: vec!["http://localhost:5173".into()],
            ..ServerSettings::default()
        };
        let cfg = ServerConfig::from_settings(&settings);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.max_connections, 3);
        assert!(!cfg.require_auth);
        assert_eq!(cfg.origins, vec!["http://localhost:5173"]);
        assert_eq!(cfg.handler_timeout_secs, 30);
    }

    #[test]
    fn from_settings_copies_timeouts() {
        let settings = ServerSettings {
            ping_interval_secs: 5,
            handler_timeout_secs: 12,
            ..ServerSettings::default()
        };
        let cfg = ServerConfig::from_settings(&settings);
        assert_eq!(cfg.ping_interval(), Duration::from_secs(5));
        assert_eq!(cfg.handler_timeout(), Duration::from_secs(12));
    }

    #[test]
    fn zero_queue_capacity_is_clamped() {
        let settings = ServerSettings {
            send_queue_capacity: 0,
            ..ServerSettings::default()
        };
        assert_eq!(ServerConfig::from_settings(&settings).send_queue_capacity, 1);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.max_connections, cfg.max_connections);
        assert_eq!(back.require_auth, cfg.require_auth);
    }
}
