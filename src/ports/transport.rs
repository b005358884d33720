//! Transport Port - Outbound chat activities.
//!
//! A transport is bound to one conversation. `send` creates a new message
//! and returns the id the channel assigned; `update` patches a message
//! previously created with `send`.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::activity::{Activity, ActivityId};
use crate::domain::conversation::ConversationAddress;

/// Port for delivering activities into a conversation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a new activity.
    async fn send(&self, activity: Activity) -> Result<ActivityId, TransportError>;

    /// Patches the activity identified by `id`.
    async fn update(&self, id: &ActivityId, activity: Activity) -> Result<(), TransportError>;
}

/// Builds transports bound to a conversation address.
pub trait TransportFactory: Send + Sync {
    /// Transport replying within the turn that produced `address`.
    fn for_conversation(&self, address: &ConversationAddress) -> Arc<dyn Transport>;

    /// Transport starting new messages in the conversation, outside any turn.
    fn proactive(&self, address: &ConversationAddress) -> Arc<dyn Transport>;
}

/// Transport errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The channel answered with a non-success status.
    #[error("channel rejected activity ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The channel could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// No bot token could be obtained.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The channel answered with a body we could not read.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}
