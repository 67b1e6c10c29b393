//! Inbound frame validation.
//!
//! [`validate`] is a pure parse/typecheck step: it never dispatches and never
//! touches the registry. Callers turn a [`ValidationFailure`] into an `error`
//! envelope addressed to the originating client only.

use serde::Deserialize;
use serde_json::Value;

use crate::envelope::{
    Action, AppEmailCode, AppEmployeeInformation, AppError, AppStats, AppUpdate, Envelope,
    Payload, Token,
};

/// A frame that does not fit the envelope schema.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{description}")]
pub struct ValidationFailure {
    /// What was wrong with the frame.
    pub description: String,
}

impl ValidationFailure {
    fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// The `error` envelope to send back to the sender.
    pub fn to_envelope(&self) -> Envelope {
        Envelope::error(&self.description)
    }
}

/// Envelope with `data` still untyped.
#[derive(Deserialize)]
struct RawEnvelope {
    action: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Parse and typecheck a raw text frame.
///
/// `data` is coerced into the payload variant belonging to a known action;
/// unknown actions fall back to first-fit resolution over [`Payload`].
/// `data: null` is treated like an absent field.
pub fn validate(raw: &str) -> Result<Envelope, ValidationFailure> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ValidationFailure::new(format!("invalid JSON: {e}")))?;

    if !value.is_object() {
        return Err(ValidationFailure::new("envelope must be a JSON object"));
    }

    let raw_env = RawEnvelope::deserialize(value)
        .map_err(|e| ValidationFailure::new(format!("invalid envelope: {e}")))?;

    let data = match raw_env.data {
        None | Some(Value::Null) => None,
        Some(data) => Some(coerce_payload(&raw_env.action, data)?),
    };

    Ok(Envelope {
        action: raw_env.action,
        data,
    })
}

fn coerce_payload(action: &str, data: Value) -> Result<Payload, ValidationFailure> {
    let result = match Action::from_wire(action) {
        Some(Action::TokenData) => serde_json::from_value::<Token>(data).map(Payload::Token),
        Some(Action::Error) => serde_json::from_value::<AppError>(data).map(Payload::Error),
        Some(Action::ServerStats) => serde_json::from_value::<AppStats>(data).map(Payload::Stats),
        Some(Action::AppUpdate) => serde_json::from_value::<AppUpdate>(data).map(Payload::Update),
        Some(Action::EmployeeInfo) => {
            serde_json::from_value::<AppEmployeeInformation>(data).map(Payload::EmployeeInformation)
        }
        Some(Action::EmailVerification) => {
            serde_json::from_value::<AppEmailCode>(data).map(Payload::EmailCode)
        }
        None => serde_json::from_value::<Payload>(data),
    };
    result.map_err(|e| ValidationFailure::new(format!("invalid data for action '{action}': {e}")))
}
