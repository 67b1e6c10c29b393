//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a settings
//! file may be partial; missing fields keep their compiled default.

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "server": { "port": 9000, "requireAuth": false },
///   "auth": { "secretKey": "change-me" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardSettings {
    /// HTTP / websocket server.
    pub server: ServerSettings,
    /// Token issuance and verification.
    pub auth: AuthSettings,
    /// Outgoing mail.
    pub smtp: SmtpSettings,
    /// Log output.
    pub logging: LoggingSettings,
    /// Employee directory seeding.
    pub employees: EmployeeSettings,
}

/// Server network and connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port (`0` picks a free port).
    pub port: u16,
    /// Maximum concurrently registered websocket clients.
    pub max_connections: usize,
    /// Largest accepted inbound frame in bytes.
    pub max_message_size: usize,
    /// Per-client outbound queue depth before messages are dropped.
    pub send_queue_capacity: usize,
    /// Whether `/ws/client` requires a bearer token with the `websockets` scope.
    pub require_auth: bool,
    /// Allowed CORS origins. Empty allows any origin.
    pub origins: Vec<String>,
    /// Seconds between server pings. Two silent intervals drop the client.
    pub ping_interval_secs: u64,
    /// Seconds an action handler may run before it is abandoned.
    pub handler_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
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

/// JWT settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSettings {
    /// HMAC secret used to sign access tokens.
    pub secret_key: String,
    /// JWT algorithm name (`HS256`, `HS384`, `HS512`).
    pub algorithm: String,
    /// Lifetime of issued access tokens.
    pub access_token_expire_minutes: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            algorithm: "HS256".to_string(),
            access_token_expire_minutes: 15,
        }
    }
}

/// SMTP settings for verification mail.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmtpSettings {
    /// SMTP server host.
    pub server_address: String,
    /// SMTP server port.
    pub port: u16,
    /// Sender address.
    pub email_address: String,
    /// Login password (only used when `secure`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Use an implicit-TLS connection with login.
    pub secure: bool,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            server_address: "localhost".to_string(),
            port: 25,
            email_address: "onboarding@localhost".to_string(),
            password: None,
            secure: false,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is not set.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Employee directory settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeSettings {
    /// JSON file with an array of employees loaded at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<String>,
}
