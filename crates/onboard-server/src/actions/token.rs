//! `token_data`: exchange a valid token for a fresh one.

use async_trait::async_trait;
use onboard_core::{Envelope, Payload, Token};
use tracing::debug;

use super::context::ActionContext;
use super::errors::ActionError;
use super::registry::ActionHandler;

/// Verifies the presented token and replies with a reissued one.
pub struct TokenDataHandler;

#[async_trait]
impl ActionHandler for TokenDataHandler {
    async fn handle(
        &self,
        data: Option<Payload>,
        ctx: &ActionContext<'_>,
    ) -> Result<Option<Envelope>, ActionError> {
        let access_token = match data {
            Some(Payload::Token(Token {
                access_token: Some(t),
                ..
            })) if !t.is_empty() => t,
            _ => return Err(ActionError::InvalidData("access_token is required".into())),
        };
        let provider = ctx
            .services
            .identity
            .as_ref()
            .ok_or(ActionError::Unavailable("token refresh"))?;

        let identity = provider.authenticate(&access_token, &[]).await?;
        debug!(username = %identity.username, client_id = %ctx.session.id(), "reissuing token");
        let fresh = provider.reissue(&identity)?;
        Ok(Some(Envelope::token(Token::bearer(fresh))))
    }
}
