//! HMAC-signed JWT access tokens.
//!
//! Claims are `sub` (username), `scopes` (granted scope names) and `exp`
//! (unix seconds).

use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AuthError;

/// One year.
const MAX_EXPIRE_MINUTES: i64 = 525_600;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(default)]
    scopes: Vec<String>,
    exp: i64,
}

/// Verified contents of an access token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenData {
    /// Token subject.
    pub username: String,
    /// Scopes claimed by the token.
    pub scopes: Vec<String>,
}

/// Signs and verifies access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_expiry: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.algorithm)
            .field("default_expiry", &self.default_expiry)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Build an issuer for an HMAC algorithm name (`HS256`, `HS384`, `HS512`).
    pub fn new(secret: &str, algorithm: &str, expire_minutes: u64) -> Result<Self, AuthError> {
        let parsed = Algorithm::from_str(algorithm)
            .ok()
            .filter(|a| matches!(a, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512))
            .ok_or_else(|| AuthError::Algorithm(algorithm.to_owned()))?;
        Ok(Self::with_algorithm(secret, parsed, expire_minutes))
    }

    /// `HS256` issuer.
    pub fn hs256(secret: &str, expire_minutes: u64) -> Self {
        Self::with_algorithm(secret, Algorithm::HS256, expire_minutes)
    }

    fn with_algorithm(secret: &str, algorithm: Algorithm, expire_minutes: u64) -> Self {
        let minutes = i64::try_from(expire_minutes)
            .unwrap_or(MAX_EXPIRE_MINUTES)
            .min(MAX_EXPIRE_MINUTES);
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            default_expiry: Duration::minutes(minutes),
        }
    }

    /// Lifetime applied when no explicit expiry is given.
    pub fn default_expiry(&self) -> Duration {
        self.default_expiry
    }

    /// Sign a token for `subject` carrying `scopes`.
    ///
    /// `expires` defaults to the configured lifetime.
    pub fn create_access_token(
        &self,
        subject: &str,
        scopes: &[String],
        expires: Option<Duration>,
    ) -> Result<String, AuthError> {
        let exp = Utc::now() + expires.unwrap_or(self.default_expiry);
        let claims = Claims {
            sub: Some(subject.to_owned()),
            scopes: scopes.to_vec(),
            exp: exp.timestamp(),
        };
        jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, then extract subject and scopes.
    pub fn decode(&self, token: &str) -> Result<TokenData, AuthError> {
        let validation = Validation::new(self.algorithm);
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                AuthError::Credentials
            })?;
        let username = data.claims.sub.ok_or(AuthError::Credentials)?;
        Ok(TokenData {
            username,
            scopes: data.claims.scopes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn scopes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn create_then_decode() {
        let issuer = TokenIssuer::hs256("secret", 15);
        let token = issuer
            .create_access_token("alice", &scopes(&["websockets"]), None)
            .unwrap();
        let data = issuer.decode(&token).unwrap();
        assert_eq!(data.username, "alice");
        assert_eq!(data.scopes, vec!["websockets"]);
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = TokenIssuer::hs256("a", 15)
            .create_access_token("alice", &[], None)
            .unwrap();
        assert_matches!(
            TokenIssuer::hs256("b", 15).decode(&token),
            Err(AuthError::Credentials)
        );
    }

    #[test]
    fn expired_token_rejected() {
        let issuer = TokenIssuer::hs256("secret", 15);
        let token = issuer
            .create_access_token("alice", &[], Some(Duration::minutes(-10)))
            .unwrap();
        assert_matches!(issuer.decode(&token), Err(AuthError::Credentials));
    }

    #[test]
    fn garbage_rejected() {
        let issuer = TokenIssuer::hs256("secret", 15);
        assert_matches!(issuer.decode("not.a.jwt"), Err(AuthError::Credentials));
    }

    #[test]
    fn missing_subject_rejected() {
        let issuer = TokenIssuer::hs256("secret", 15);
        let claims = Claims {
            sub: None,
            scopes: vec![],
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert_matches!(issuer.decode(&token), Err(AuthError::Credentials));
    }

    #[test]
    fn algorithm_parsing() {
        assert!(TokenIssuer::new("s", "HS512", 5).is_ok());
        assert_matches!(TokenIssuer::new("s", "RS256", 5), Err(AuthError::Algorithm(_)));
        assert_matches!(TokenIssuer::new("s", "bogus", 5), Err(AuthError::Algorithm(_)));
    }

    #[test]
    fn algorithm_mismatch_rejected() {
        let token = TokenIssuer::new("s", "HS512", 5)
            .unwrap()
            .create_access_token("alice", &[], None)
            .unwrap();
        assert!(TokenIssuer::hs256("s", 5).decode(&token).is_err());
    }

    #[test]
    fn default_expiry_from_minutes() {
        assert_eq!(
            TokenIssuer::hs256("s", 15).default_expiry(),
            Duration::minutes(15)
        );
    }
}
