//! Errors surfaced by the stream coordinator.

use thiserror::Error;

use crate::domain::foundation::ValidationError;
use crate::domain::streaming::StreamCheckpoint;
use crate::ports::{CompletionError, TransportError};

/// Why a streamed reply did not reach its final send.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// A send or update failed. The session was abandoned on the spot.
    #[error("transport failure: {0}")]
    TransportFailure(#[source] TransportError),

    /// The fragment source ended without a terminal marker.
    #[error("completion stream ended without a terminal marker at sequence {}", .0.sequence)]
    IncompleteStream(StreamCheckpoint),

    /// Pulling the next fragment failed.
    #[error("completion stream failed: {0}")]
    Upstream(#[source] CompletionError),

    /// The inbound call was aborted before the final send.
    #[error("stream cancelled")]
    Cancelled,

    /// Internal invariant violation.
    #[error("invalid stream transition: {0}")]
    InvalidTransition(#[from] ValidationError),
}

impl StreamError {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamError::TransportFailure(_) => "transport_failure",
            StreamError::IncompleteStream(_) => "incomplete_stream",
            StreamError::Upstream(_) => "upstream",
            StreamError::Cancelled => "cancelled",
            StreamError::InvalidTransition(_) => "invalid_transition",
        }
    }
}
