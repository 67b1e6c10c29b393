//! Auth error types.

/// Errors raised while issuing or verifying access tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Token is malformed, expired, badly signed, or names an unknown user.
    #[error("could not validate credentials")]
    Credentials,

    /// Token is valid but lacks a required scope, or claims a scope the
    /// user was never granted.
    #[error("not enough permissions: missing scope '{scope}'")]
    Permissions {
        /// The offending scope.
        scope: String,
    },

    /// Signing failed.
    #[error("token signing failed: {0}")]
    Signing(String),

    /// Unsupported algorithm name in configuration.
    #[error("unsupported JWT algorithm: {0}")]
    Algorithm(String),

    /// User already present in the directory.
    #[error("username already exists: {0}")]
    UserExists(String),

    /// Role not in the scope catalogue.
    #[error("invalid role: {0}")]
    InvalidRole(String),
}

impl AuthError {
    /// Whether this error should surface as HTTP 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Credentials | Self::Permissions { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_display() {
        let err = AuthError::Permissions {
            scope: "websockets".into(),
        };
        assert_eq!(
            err.to_string(),
            "not enough permissions: missing scope 'websockets'"
        );
    }

    #[test]
    fn unauthorized_classification() {
        assert!(AuthError::Credentials.is_unauthorized());
        assert!(
            AuthError::Permissions {
                scope: "admin".into()
            }
            .is_unauthorized()
        );
        assert!(!AuthError::Signing("x".into()).is_unauthorized());
        assert!(!AuthError::UserExists("bob".into()).is_unauthorized());
    }
}
