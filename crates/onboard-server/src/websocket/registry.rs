//! Live session registry.
//!
//! The registry is the single source of truth for who is online. It is
//! constructed once per server and shared by handle with every session
//! task. Connect and disconnect take the write lock; targeted sends,
//! broadcasts and `count` take the read lock, so a broadcast always sees a
//! consistent snapshot and a count is never torn.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use onboard_core::{ClientId, ConnectionError, Envelope};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::connection::Session;
use crate::metrics::{WS_BROADCAST_DROPS_TOTAL, WS_SEND_DROPS_TOTAL};

/// Delivery result of a broadcast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Sessions the frame was enqueued for.
    pub delivered: usize,
    /// Sessions whose queue refused the frame.
    pub failed: usize,
}

/// Registered sessions keyed by client ID.
pub struct ConnectionRegistry {
    sessions: RwLock<HashMap<ClientId, Arc<Session>>>,
    max_connections: usize,
}

impl ConnectionRegistry {
    /// Create a registry accepting at most `max_connections` sessions.
    pub fn new(max_connections: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_connections,
        }
    }

    /// Configured limit.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Register `session`. Returns the new count.
    ///
    /// A live session with the same ID is left untouched and the new one is
    /// refused with [`ConnectionError::Conflict`].
    pub async fn connect(&self, session: Arc<Session>) -> Result<usize, ConnectionError> {
        let mut sessions = self.sessions.write().await;
        let id = session.id();
        if sessions.contains_key(&id) {
            return Err(ConnectionError::Conflict(id));
        }
        if sessions.len() >= self.max_connections {
            return Err(ConnectionError::AtCapacity {
                limit: self.max_connections,
            });
        }
        let _ = sessions.insert(id, session);
        debug!(client_id = %id, count = sessions.len(), "session registered");
        Ok(sessions.len())
    }

    /// Unregister `id`, returning the removed session.
    pub async fn disconnect(&self, id: ClientId) -> Result<Arc<Session>, ConnectionError> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(&id).ok_or(ConnectionError::NotFound(id))?;
        debug!(client_id = %id, count = sessions.len(), "session unregistered");
        Ok(removed)
    }

    /// Send `envelope` to exactly one session.
    pub async fn send(&self, id: ClientId, envelope: &Envelope) -> Result<(), ConnectionError> {
        let json = Arc::new(envelope.to_json()?);
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id).ok_or(ConnectionError::NotFound(id))?;
        if session.send(json) {
            Ok(())
        } else {
            counter!(WS_SEND_DROPS_TOTAL).increment(1);
            Err(ConnectionError::Transport {
                client_id: id,
                reason: "outbound queue full or closed".into(),
            })
        }
    }

    /// Send `envelope` to every registered session.
    ///
    /// The envelope is serialized once. A session whose queue refuses the
    /// frame is logged and skipped; delivery to the rest continues.
    pub async fn broadcast(&self, envelope: &Envelope) -> Result<BroadcastOutcome, ConnectionError> {
        self.broadcast_with(|_| envelope.clone()).await
    }

    /// Broadcast an envelope built from the registered count, under the same
    /// snapshot the frame is delivered to.
    pub async fn broadcast_with(
        &self,
        build: impl FnOnce(usize) -> Envelope,
    ) -> Result<BroadcastOutcome, ConnectionError> {
        let sessions = self.sessions.read().await;
        let envelope = build(sessions.len());
        let json = Arc::new(envelope.to_json()?);

        let mut outcome = BroadcastOutcome::default();
        for session in sessions.values() {
            if session.send(Arc::clone(&json)) {
                outcome.delivered += 1;
            } else {
                outcome.failed += 1;
                counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                warn!(client_id = %session.id(), action = %envelope.action, "failed to deliver broadcast");
            }
        }
        debug!(
            action = %envelope.action,
            delivered = outcome.delivered,
            failed = outcome.failed,
            "broadcast"
        );
        Ok(outcome)
    }

    /// Registered session count.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Look up a session.
    pub async fn get(&self, id: ClientId) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Whether `id` is registered.
    pub async fn contains(&self, id: ClientId) -> bool {
        self.sessions.read().await.contains_key(&id)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}
