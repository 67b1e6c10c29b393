//! Employee error types.

use crate::model::EmployeeAttribute;

/// Errors from directory and verification operations.
#[derive(Debug, thiserror::Error)]
pub enum EmployeeError {
    /// No employee matched the lookup.
    #[error("employee with {attribute} = {value} does not exist")]
    NotFound {
        /// Attribute used for the lookup.
        attribute: EmployeeAttribute,
        /// Value looked up.
        value: String,
    },

    /// An employee with this internal id is already stored.
    #[error("employee with internal_id {0} already exists")]
    AlreadyExists(String),

    /// Onboarding state already created for this employee.
    #[error("state for employee {0} already exists")]
    StateAlreadyExists(String),

    /// No onboarding state for this employee.
    #[error("no state found for employee {0}")]
    StateNotFound(String),

    /// Malformed employee identifier.
    #[error("invalid employee identifier: {0}")]
    InvalidIdentifier(String),

    /// Seed file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EmployeeError {
    /// Whether the error is a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::StateNotFound(_))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, EmployeeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = EmployeeError::NotFound {
            attribute: EmployeeAttribute::Email,
            value: "a@b.c".into(),
        };
        assert_eq!(err.to_string(), "employee with email = a@b.c does not exist");
        assert!(err.is_not_found());
    }

    #[test]
    fn already_exists_is_not_a_miss() {
        assert!(!EmployeeError::AlreadyExists("1".into()).is_not_found());
        assert!(EmployeeError::StateNotFound("1".into()).is_not_found());
    }
}
