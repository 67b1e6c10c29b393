//! `server_stats`: reply with the live session count.

use async_trait::async_trait;
use onboard_core::{Envelope, Payload};

use super::context::ActionContext;
use super::errors::ActionError;
use super::registry::ActionHandler;

/// Answers a stats request to the asking session only.
pub struct ServerStatsHandler;

#[async_trait]
impl ActionHandler for ServerStatsHandler {
    async fn handle(
        &self,
        _data: Option<Payload>,
        ctx: &ActionContext<'_>,
    ) -> Result<Option<Envelope>, ActionError> {
        Ok(Some(Envelope::stats(ctx.registry.count().await)))
    }
}
