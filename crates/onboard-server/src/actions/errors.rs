//! Action error types with wire codes.

use onboard_auth::AuthError;
use onboard_core::Envelope;
use onboard_employees::EmployeeError;

/// Failure of a single action. Always reported to the originating session
/// as an `error` envelope; the session keeps running.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// `data` is missing or has the wrong shape for this action.
    #[error("{0}")]
    InvalidData(String),

    /// The session's identity lacks a required scope.
    #[error("not enough permissions: missing scope '{scope}'")]
    Forbidden {
        /// Missing scope.
        scope: String,
    },

    /// `email_verification` before a successful `employee_info`.
    #[error("no employee selected on this session")]
    NoEmployee,

    /// A collaborator the action needs is not configured.
    #[error("{0} is not available on this server")]
    Unavailable(&'static str),

    /// Token verification or issuance failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Employee lookup or state update failed.
    #[error(transparent)]
    Employee(#[from] EmployeeError),

    /// The handler ran past its deadline.
    #[error("action timed out")]
    Timeout,
}

impl ActionError {
    /// Stable error code, used as a metrics label.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidData(_) => "INVALID_DATA",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::NoEmployee => "NO_EMPLOYEE",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Auth(_) => "AUTH_ERROR",
            Self::Employee(_) => "EMPLOYEE_ERROR",
            Self::Timeout => "TIMEOUT",
        }
    }

    /// The `error` envelope reporting this failure.
    pub fn to_envelope(&self) -> Envelope {
        Envelope::error(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboard_core::{AppError, Payload};

    #[test]
    fn codes() {
        assert_eq!(ActionError::NoEmployee.code(), "NO_EMPLOYEE");
        assert_eq!(ActionError::Timeout.code(), "TIMEOUT");
        assert_eq!(ActionError::Auth(AuthError::Credentials).code(), "AUTH_ERROR");
        assert_eq!(
            ActionError::Forbidden {
                scope: "websockets".into()
            }
            .code(),
            "FORBIDDEN"
        );
    }

    #[test]
    fn envelope_carries_message() {
        let env = ActionError::Unavailable("token refresh").to_envelope();
        assert_eq!(env.action, "error");
        assert_eq!(
            env.data,
            Some(Payload::Error(AppError {
                error: "token refresh is not available on this server".into()
            }))
        );
    }

    #[test]
    fn transparent_wrapping() {
        let err = ActionError::from(EmployeeError::InvalidIdentifier("x".into()));
        assert_eq!(err.to_string(), "invalid employee identifier: x");
    }
}
