//! Action registry and async dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use onboard_core::{Action, Envelope, Payload};
use tracing::{debug, error, warn};

use super::context::ActionContext;
use super::errors::ActionError;
use crate::metrics::{WS_ACTION_DURATION_SECONDS, WS_ACTION_ERRORS_TOTAL, WS_ACTIONS_TOTAL};

/// Implemented by every action handler.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Scopes the session identity must hold. `admin` satisfies any.
    fn required_scopes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Handle one envelope. `Ok(Some(_))` is sent back to the origin.
    async fn handle(
        &self,
        data: Option<Payload>,
        ctx: &ActionContext<'_>,
    ) -> Result<Option<Envelope>, ActionError>;
}

/// Maps action names to handlers.
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
    timeout: Duration,
}

impl ActionRegistry {
    /// Default per-handler deadline.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-handler deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register `handler` for `action`, replacing any previous one.
    pub fn register(&mut self, action: Action, handler: impl ActionHandler + 'static) {
        let _ = self
            .handlers
            .insert(action.as_str().to_owned(), Arc::new(handler));
    }

    /// Whether `action` has a handler.
    pub fn has_action(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Registered action names, sorted.
    pub fn actions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Dispatch a validated envelope. Returns the reply for the origin.
    ///
    /// Actions without a handler are ignored. Handler failures, scope
    /// denials and timeouts become `error` envelopes.
    pub async fn dispatch(&self, envelope: Envelope, ctx: &ActionContext<'_>) -> Option<Envelope> {
        let action = envelope.action;
        let Some(handler) = self.handlers.get(&action) else {
            debug!(action = %action, "no handler for action, ignoring");
            return None;
        };
        counter!(WS_ACTIONS_TOTAL, "action" => action.clone()).increment(1);

        if let Some(scope) = ctx.session.identity().missing_scope(handler.required_scopes()) {
            let err = ActionError::Forbidden {
                scope: scope.to_owned(),
            };
            return Some(Self::report(&action, &err));
        }

        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, handler.handle(envelope.data, ctx)).await;
        histogram!(WS_ACTION_DURATION_SECONDS, "action" => action.clone())
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => Some(Self::report(&action, &err)),
            Err(_elapsed) => {
                error!(action = %action, "action handler timed out after {:?}", self.timeout);
                Some(Self::report(&action, &ActionError::Timeout))
            }
        }
    }

    fn report(action: &str, err: &ActionError) -> Envelope {
        counter!(WS_ACTION_ERRORS_TOTAL, "action" => action.to_owned(), "error_type" => err.code())
            .increment(1);
        warn!(action, code = err.code(), error = %err, "action failed");
        err.to_envelope()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
