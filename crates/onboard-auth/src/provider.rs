//! Bearer token to identity resolution.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::AuthError;
use crate::scopes::{ADMIN, WEBSOCKETS};
use crate::tokens::TokenIssuer;
use crate::users::UserDirectory;

/// An authenticated principal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// Verified username.
    pub username: String,
    /// Scopes the principal may exercise.
    pub scopes: Vec<String>,
}

impl Identity {
    /// Identity used when authentication is disabled.
    pub fn anonymous() -> Self {
        Self {
            username: "anonymous".to_owned(),
            scopes: vec![WEBSOCKETS.to_owned()],
        }
    }

    /// Whether the identity holds `scope`. `admin` holds every scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope || s == ADMIN)
    }

    /// First scope in `required` the identity does not hold.
    pub fn missing_scope<'a>(&self, required: &[&'a str]) -> Option<&'a str> {
        required.iter().copied().find(|s| !self.has_scope(s))
    }
}

/// Resolves bearer tokens to identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify `token` and require every scope in `required`.
    async fn authenticate(&self, token: &str, required: &[&str]) -> Result<Identity, AuthError>;

    /// Issue a fresh token for an already authenticated identity.
    fn reissue(&self, identity: &Identity) -> Result<String, AuthError>;
}

/// JWT-backed provider.
///
/// Every scope in the token must have been granted to the user, and the
/// user must still exist.
#[derive(Clone)]
pub struct JwtIdentityProvider {
    issuer: TokenIssuer,
    users: Arc<dyn UserDirectory>,
}

impl JwtIdentityProvider {
    /// Create a provider.
    pub fn new(issuer: TokenIssuer, users: Arc<dyn UserDirectory>) -> Self {
        Self { issuer, users }
    }

    /// The token issuer.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn authenticate(&self, token: &str, required: &[&str]) -> Result<Identity, AuthError> {
        let data = self.issuer.decode(token)?;

        let Some(user) = self.users.get_by_username(&data.username).await else {
            debug!(username = %data.username, "token subject not found");
            return Err(AuthError::Credentials);
        };

        if let Some(scope) = data.scopes.iter().find(|s| !user.has_role(s)) {
            warn!(username = %user.username, scope = %scope, "token claims ungranted scope");
            return Err(AuthError::Permissions {
                scope: scope.clone(),
            });
        }

        let identity = Identity {
            username: data.username,
            scopes: data.scopes,
        };
        if let Some(scope) = identity.missing_scope(required) {
            return Err(AuthError::Permissions {
                scope: scope.to_owned(),
            });
        }
        Ok(identity)
    }

    fn reissue(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issuer
            .create_access_token(&identity.username, &identity.scopes, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{MockUserDirectory, User};
    use assert_matches::assert_matches;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    fn provider_with(user: Option<User>) -> JwtIdentityProvider {
        let mut users = MockUserDirectory::new();
        let _ = users
            .expect_get_by_username()
            .returning(move |_| user.clone());
        JwtIdentityProvider::new(TokenIssuer::hs256("secret", 15), Arc::new(users))
    }

    fn user(roles: &[&str]) -> User {
        User {
            username: "alice".into(),
            roles: strings(roles),
        }
    }

    #[tokio::test]
    async fn valid_token_with_required_scope() {
        let provider = provider_with(Some(user(&["websockets", "user:own"])));
        let token = provider
            .issuer()
            .create_access_token("alice", &strings(&["websockets"]), None)
            .unwrap();
        let identity = provider.authenticate(&token, &[WEBSOCKETS]).await.unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.scopes, vec!["websockets"]);
    }

    #[tokio::test]
    async fn unknown_user_is_credentials_error() {
        let provider = provider_with(None);
        let token = provider
            .issuer()
            .create_access_token("alice", &[], None)
            .unwrap();
        assert_matches!(
            provider.authenticate(&token, &[]).await,
            Err(AuthError::Credentials)
        );
    }

    #[tokio::test]
    async fn ungranted_token_scope_rejected() {
        let provider = provider_with(Some(user(&["user:own"])));
        let token = provider
            .issuer()
            .create_access_token("alice", &strings(&["websockets"]), None)
            .unwrap();
        assert_matches!(
            provider.authenticate(&token, &[]).await,
            Err(AuthError::Permissions { scope }) if scope == "websockets"
        );
    }

    #[tokio::test]
    async fn missing_required_scope_rejected() {
        let provider = provider_with(Some(user(&["user:own", "websockets"])));
        let token = provider
            .issuer()
            .create_access_token("alice", &strings(&["user:own"]), None)
            .unwrap();
        assert_matches!(
            provider.authenticate(&token, &[WEBSOCKETS]).await,
            Err(AuthError::Permissions { scope }) if scope == WEBSOCKETS
        );
    }

    #[tokio::test]
    async fn admin_satisfies_required_scope() {
        let provider = provider_with(Some(user(&["admin"])));
        let token = provider
            .issuer()
            .create_access_token("alice", &strings(&["admin"]), None)
            .unwrap();
        let identity = provider.authenticate(&token, &[WEBSOCKETS]).await.unwrap();
        assert!(identity.has_scope("employee:others.write"));
    }

    #[tokio::test]
    async fn reissue_preserves_subject_and_scopes() {
        let provider = provider_with(Some(user(&["websockets"])));
        let identity = Identity {
            username: "alice".into(),
            scopes: strings(&["websockets"]),
        };
        let token = provider.reissue(&identity).unwrap();
        let again = provider.authenticate(&token, &[WEBSOCKETS]).await.unwrap();
        assert_eq!(again, identity);
    }

    #[test]
    fn anonymous_has_websockets_only() {
        let anon = Identity::anonymous();
        assert!(anon.has_scope(WEBSOCKETS));
        assert_eq!(anon.missing_scope(&[WEBSOCKETS, ADMIN]), Some(ADMIN));
    }
}
