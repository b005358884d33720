//! Errors surfaced by conversation turn handlers.

use thiserror::Error;

use crate::domain::foundation::ValidationError;
use crate::ports::{DirectoryError, TransportError};

/// Why a turn could not be completed.
///
/// Completion failures never show up here; they are answered with an
/// apology inside the turn.
#[derive(Debug, Clone, Error)]
pub enum TurnError {
    #[error("invalid inbound activity: {0}")]
    InvalidActivity(#[from] ValidationError),

    #[error("could not deliver to channel: {0}")]
    Transport(#[from] TransportError),

    #[error("conversation directory failed: {0}")]
    Directory(#[from] DirectoryError),

    #[error("turn cancelled")]
    Cancelled,
}
