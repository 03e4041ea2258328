//! Requester error types.

use dlc_ticket_protocol::ProtocolError;

use crate::store::StoreError;

/// Errors surfaced by [`JobRequester`](crate::JobRequester) operations.
#[derive(Debug, thiserror::Error)]
pub enum RequesterError {
    /// Image cannot be tested; nothing was written.
    #[error("invalid image '{image}': {reason}")]
    InvalidImage { image: String, reason: String },

    /// Instance count must be at least 1; nothing was written.
    #[error("instances_num must be at least 1, got {0}")]
    InvalidInstanceCount(u32),

    /// Ticket is in none of the four folders after every attempt.
    #[error("request ticket {ticket} could not be found")]
    NotFound { ticket: String },

    /// Resource-pool entry carries a state label the requester does not know.
    #[error("unrecognized state '{label}' in {key}")]
    UnrecognizedState { key: String, label: String },

    /// Stored JSON could not be decoded.
    #[error("malformed object body at {key}: {source}")]
    MalformedBody {
        key: String,
        #[source]
        source: ProtocolError,
    },

    #[error(transparent)]
    Protocol(ProtocolError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ProtocolError> for RequesterError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidImage { image, reason } => Self::InvalidImage { image, reason },
            other => Self::Protocol(other),
        }
    }
}

impl RequesterError {
    /// Whether the same call may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}
