//! Inbound frame handling: validate, then dispatch by action.

use metrics::counter;
use tracing::{debug, instrument, warn};

use onboard_core::{Envelope, validate};

use crate::actions::{ActionContext, ActionRegistry};
use crate::metrics::WS_PROTOCOL_ERRORS_TOTAL;

/// Handle one inbound text frame.
///
/// Returns the envelope to send back to the originating session, if any.
/// Malformed frames produce an `error` envelope and never reach a handler
/// or the other sessions.
#[instrument(skip_all, fields(client_id = %ctx.session.id(), action))]
pub async fn handle_message(
    text: &str,
    ctx: &ActionContext<'_>,
    actions: &ActionRegistry,
) -> Option<Envelope> {
    let envelope = match validate(text) {
        Ok(envelope) => envelope,
        Err(failure) => {
            warn!(error = %failure, "invalid frame");
            counter!(WS_PROTOCOL_ERRORS_TOTAL).increment(1);
            return Some(failure.to_envelope());
        }
    };

    let _ = tracing::Span::current().record("action", envelope.action.as_str());
    debug!("dispatching action");
    actions.dispatch(envelope, ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_helpers::{full_context, session_for, websockets_identity};
    use crate::actions::{ServerContext, register_all};
    use crate::websocket::registry::ConnectionRegistry;
    use onboard_core::{AppError, Payload};

    fn registry() -> ActionRegistry {
        let mut actions = ActionRegistry::new();
        register_all(&mut actions);
        actions
    }

    async fn handle(text: &str, services: &ServerContext) -> Option<Envelope> {
        let (session, _rx) = session_for(websockets_identity());
        let conns = ConnectionRegistry::default();
        let _ = conns.connect(session.clone()).await.unwrap();
        let ctx = ActionContext {
            session: &session,
            registry: &conns,
            services,
        };
        handle_message(text, &ctx, &registry()).await
    }

    #[tokio::test]
    async fn stats_request_replies_with_count() {
        let reply = handle(r#"{"action":"server_stats"}"#, &ServerContext::default()).await;
        assert_eq!(reply, Some(Envelope::stats(1)));
    }

    #[tokio::test]
    async fn malformed_json_replies_error() {
        let reply = handle("{oops", &ServerContext::default()).await.unwrap();
        assert_eq!(reply.action, "error");
        match reply.data {
            Some(Payload::Error(AppError { error })) => assert!(error.starts_with("invalid JSON")),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn wrong_payload_shape_replies_error() {
        let reply = handle(
            r#"{"action":"employee_info","data":{"active_users":3}}"#,
            &full_context(),
        )
        .await
        .unwrap();
        assert_eq!(reply.action, "error");
    }

    #[tokio::test]
    async fn unhandled_action_is_silent() {
        assert!(handle(r#"{"action":"app_update","data":{}}"#, &ServerContext::default())
            .await
            .is_none());
        assert!(handle(r#"{"action":"dance"}"#, &ServerContext::default())
            .await
            .is_none());
    }
}
