//! Conversation Directory Port - Stored conversation addresses.
//!
//! Addresses are captured on every inbound turn so the bot can later send
//! proactive messages to a conversation it is no longer replying in.

use async_trait::async_trait;

use crate::domain::conversation::ConversationAddress;

/// Port for persisting and looking up conversation addresses.
///
/// Every call is self-contained and idempotent.
#[async_trait]
pub trait ConversationDirectory: Send + Sync {
    /// Inserts or replaces the address keyed by its conversation id.
    async fn upsert(&self, address: &ConversationAddress) -> Result<(), DirectoryError>;

    async fn find_by_conversation_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationAddress>, DirectoryError>;

    /// Finds the personal (1:1) conversation of the user with this AAD id.
    async fn find_by_aad_object_id(
        &self,
        aad_object_id: &str,
    ) -> Result<Option<ConversationAddress>, DirectoryError>;

    /// Finds by personal conversation name, then by user display name.
    async fn find_by_name(&self, name: &str)
        -> Result<Option<ConversationAddress>, DirectoryError>;

    /// Removes the address. Returns true if one was stored.
    async fn remove(&self, conversation_id: &str) -> Result<bool, DirectoryError>;
}

/// Directory errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("stored address is unreadable: {0}")]
    Corrupt(String),
}
