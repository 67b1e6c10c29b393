//! Presence notifications.
//!
//! After every successful connect and every disconnect the live count is
//! broadcast to all registered sessions as `server_stats`.

use onboard_core::{ConnectionError, Envelope};
use tracing::{debug, warn};

use super::registry::{BroadcastOutcome, ConnectionRegistry};

/// Broadcast the current count as `server_stats`.
///
/// The count and the recipient set come from the same registry snapshot.
pub async fn notify(registry: &ConnectionRegistry) -> Result<BroadcastOutcome, ConnectionError> {
    let outcome = registry.broadcast_with(Envelope::stats).await;
    match &outcome {
        Ok(o) => debug!(delivered = o.delivered, failed = o.failed, "presence broadcast"),
        Err(e) => warn!(error = %e, "presence broadcast failed"),
    }
    outcome
}
