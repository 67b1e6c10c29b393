//! Registry error types.

use thiserror::Error;

use crate::ids::ClientId;

/// Errors raised by connection registry operations.
///
/// All variants are session-local: callers log them and carry on.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// No live session is registered under this ID.
    #[error("client {0} is not connected")]
    NotFound(ClientId),

    /// A live session already holds this ID.
    #[error("client {0} is already connected")]
    Conflict(ClientId),

    /// The registry already holds its maximum number of sessions.
    #[error("connection limit of {limit} reached")]
    AtCapacity {
        /// Configured maximum.
        limit: usize,
    },

    /// The session's transport refused the write (closed or backed up).
    #[error("transport for client {client_id} failed: {reason}")]
    Transport {
        /// Affected client.
        client_id: ClientId,
        /// Why the write failed.
        reason: String,
    },

    /// The outbound envelope could not be serialized.
    #[error("failed to serialize envelope: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConnectionError {
    /// Machine-readable kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::AtCapacity { .. } => "at_capacity",
            Self::Transport { .. } => "transport",
            Self::Serialization(_) => "serialization",
        }
    }
}
