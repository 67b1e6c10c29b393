//! Wire envelope exchanged over a client websocket.
//!
//! Every frame, inbound or outbound, is a JSON object:
//!
//! ```json
//! { "action": "server_stats", "data": { "active_users": 2 } }
//! ```
//!
//! `data` is one of a closed set of payload shapes. Each payload struct
//! rejects unknown fields so that untagged resolution picks the first shape
//! that actually fits instead of the first one that happens to be permissive.

use serde::{Deserialize, Serialize};

// ── Payload variants ────────────────────────────────────────────────

/// Bearer token as handed out by the login flow.
///
/// Both keys must be present on the wire, although either may be `null`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Token {
    /// Encoded JWT.
    #[serde(deserialize_with = "Option::deserialize")]
    pub access_token: Option<String>,
    /// Token type, normally `"bearer"`.
    #[serde(deserialize_with = "Option::deserialize")]
    pub token_type: Option<String>,
}

impl Token {
    /// A bearer token wrapping `access_token`.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            token_type: Some("bearer".into()),
        }
    }
}

/// Error description sent back to a single client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppError {
    /// Human-readable description.
    pub error: String,
}

/// Live server statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppStats {
    /// Number of registered sessions.
    pub active_users: u64,
}

/// Onboarding progress for the employee bound to a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppUpdate {
    /// Whether an email lookup matched an employee.
    pub email_exists: Option<bool>,
    /// Whether an internal-id lookup matched an employee.
    pub employee_id_exists: Option<bool>,
    /// Whether the verification code email was delivered.
    pub email_code_sent: bool,
    /// Whether the client entered the right verification code.
    pub email_code_validated: bool,
}

/// Employee identifier submitted by a client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppEmployeeInformation {
    /// Internal employee number.
    #[serde(default)]
    pub employee_id: Option<String>,
    /// Employee email address.
    #[serde(default)]
    pub employee_email: Option<String>,
}

/// Verification code typed in by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppEmailCode {
    /// The code as received in the email.
    pub email_code: String,
}

/// Polymorphic envelope payload.
///
/// Untagged: variants are tried top to bottom and the first structurally
/// valid one wins. Envelopes with a known [`Action`] skip this resolution
/// and are coerced straight into the action's variant by the validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Bearer token.
    Token(Token),
    /// Error reply.
    Error(AppError),
    /// Server statistics.
    Stats(AppStats),
    /// Onboarding progress update.
    Update(AppUpdate),
    /// Employee lookup request.
    EmployeeInformation(AppEmployeeInformation),
    /// Verification code submission.
    EmailCode(AppEmailCode),
}

// ── Actions ─────────────────────────────────────────────────────────

/// Action tags with a fixed payload shape.
///
/// Envelopes may carry any action string; these are the ones the server
/// understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// `token_data`: token presentation / refresh.
    TokenData,
    /// `error`: protocol or handler failure.
    Error,
    /// `server_stats`: presence statistics.
    ServerStats,
    /// `app_update`: onboarding progress.
    AppUpdate,
    /// `employee_info`: employee lookup.
    EmployeeInfo,
    /// `email_verification`: verification code check.
    EmailVerification,
}

impl Action {
    /// All known actions.
    pub const ALL: [Self; 6] = [
        Self::TokenData,
        Self::Error,
        Self::ServerStats,
        Self::AppUpdate,
        Self::EmployeeInfo,
        Self::EmailVerification,
    ];

    /// Wire name of the action.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TokenData => "token_data",
            Self::Error => "error",
            Self::ServerStats => "server_stats",
            Self::AppUpdate => "app_update",
            Self::EmployeeInfo => "employee_info",
            Self::EmailVerification => "email_verification",
        }
    }

    /// Look up an action by wire name.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Envelope ────────────────────────────────────────────────────────

/// A single websocket message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Action tag.
    pub action: String,
    /// Payload, absent for bare requests such as `{"action":"server_stats"}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
}

impl Envelope {
    /// Build an envelope for a known action.
    pub fn new(action: Action, data: Option<Payload>) -> Self {
        Self {
            action: action.as_str().to_owned(),
            data,
        }
    }

    /// `server_stats` envelope carrying the live session count.
    pub fn stats(active_users: usize) -> Self {
        Self::new(
            Action::ServerStats,
            Some(Payload::Stats(AppStats {
                active_users: active_users as u64,
            })),
        )
    }

    /// `error` envelope with a description.
    pub fn error(description: impl Into<String>) -> Self {
        Self::new(
            Action::Error,
            Some(Payload::Error(AppError {
                error: description.into(),
            })),
        )
    }

    /// `app_update` envelope.
    pub fn update(update: AppUpdate) -> Self {
        Self::new(Action::AppUpdate, Some(Payload::Update(update)))
    }

    /// `token_data` envelope.
    pub fn token(token: Token) -> Self {
        Self::new(Action::TokenData, Some(Payload::Token(token)))
    }

    /// The known action this envelope carries, if any.
    pub fn known_action(&self) -> Option<Action> {
        Action::from_wire(&self.action)
    }

    /// Serialize to the wire format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
