//! # onboard-auth
//!
//! Scope-based bearer authentication for the onboarding backend.
//!
//! - [`scopes`]: the OAuth2 scope catalogue and default role sets
//! - [`tokens`]: [`TokenIssuer`] signs and decodes HMAC JWT access tokens
//! - [`provider`]: [`IdentityProvider`] resolves a bearer token to an
//!   [`Identity`], checking token scopes against the user's granted roles
//! - [`users`]: [`UserDirectory`] and its in-memory implementation

#![deny(unsafe_code)]

pub mod errors;
pub mod provider;
pub mod scopes;
pub mod tokens;
pub mod users;

pub use errors::AuthError;
pub use provider::{Identity, IdentityProvider, JwtIdentityProvider};
pub use scopes::{ADMIN, OAUTH_SCOPES, WEBSOCKETS, is_known_scope};
pub use tokens::{TokenData, TokenIssuer};
pub use users::{InMemoryUserDirectory, User, UserDirectory};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _issuer = TokenIssuer::hs256("secret", 15);
        let _dir = InMemoryUserDirectory::new();
        assert!(is_known_scope(WEBSOCKETS));
    }
}
