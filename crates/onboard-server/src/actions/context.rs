//! Dependencies handed to action handlers.

use std::sync::Arc;

use onboard_auth::IdentityProvider;
use onboard_employees::EmailVerificationService;

use crate::websocket::connection::Session;
use crate::websocket::registry::ConnectionRegistry;

/// Process-wide collaborators. Absent collaborators make the actions that
/// need them reply with an `error`.
#[derive(Clone, Default)]
pub struct ServerContext {
    /// Verifies and reissues bearer tokens.
    pub identity: Option<Arc<dyn IdentityProvider>>,
    /// Employee lookup plus verification mail.
    pub verification: Option<EmailVerificationService>,
}

impl ServerContext {
    /// Attach an identity provider.
    #[must_use]
    pub fn with_identity(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }

    /// Attach the employee verification service.
    #[must_use]
    pub fn with_verification(mut self, service: EmailVerificationService) -> Self {
        self.verification = Some(service);
        self
    }
}

/// Per-message view: who sent it, plus shared state.
pub struct ActionContext<'a> {
    /// Originating session.
    pub session: &'a Arc<Session>,
    /// Live registry.
    pub registry: &'a ConnectionRegistry,
    /// Collaborators.
    pub services: &'a ServerContext,
}
