//! In-memory conversation directory for tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::ConversationAddress;
use crate::ports::{ConversationDirectory, DirectoryError};

/// Process-local directory keyed by conversation id.
///
/// Lookups that can match several rows return the most recently upserted
/// one, the same order the PostgreSQL adapter uses.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationDirectory {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    unavailable: bool,
}

#[derive(Debug, Clone)]
struct Entry {
    address: ConversationAddress,
    /// Monotonic write counter standing in for `updated_at`.
    revision: u64,
}

impl InMemoryConversationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory whose every call fails with a connection error.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    fn ensure_available(&self) -> Result<(), DirectoryError> {
        if self.unavailable {
            return Err(DirectoryError::Connection("directory unavailable".to_string()));
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn latest_matching<F>(&self, predicate: F) -> Option<ConversationAddress>
    where
        F: Fn(&ConversationAddress) -> bool,
    {
        let entries = self.entries.read().await;
        entries
            .values()
            .filter(|entry| predicate(&entry.address))
            .max_by_key(|entry| entry.revision)
            .map(|entry| entry.address.clone())
    }
}

#[async_trait]
impl ConversationDirectory for InMemoryConversationDirectory {
    async fn upsert(&self, address: &ConversationAddress) -> Result<(), DirectoryError> {
        self.ensure_available()?;
        let mut entries = self.entries.write().await;
        let revision = entries.values().map(|e| e.revision).max().unwrap_or(0) + 1;
        entries.insert(
            address.conversation_id().to_string(),
            Entry {
                address: address.clone(),
                revision,
            },
        );
        Ok(())
    }

    async fn find_by_conversation_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationAddress>, DirectoryError> {
        self.ensure_available()?;
        let entries = self.entries.read().await;
        Ok(entries.get(conversation_id).map(|e| e.address.clone()))
    }

    async fn find_by_aad_object_id(
        &self,
        aad_object_id: &str,
    ) -> Result<Option<ConversationAddress>, DirectoryError> {
        self.ensure_available()?;
        Ok(self
            .latest_matching(|a| a.is_personal() && a.user_aad_object_id() == Some(aad_object_id))
            .await)
    }

    async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ConversationAddress>, DirectoryError> {
        self.ensure_available()?;
        let by_conversation = self
            .latest_matching(|a| a.is_personal() && a.conversation().name.as_deref() == Some(name))
            .await;
        if by_conversation.is_some() {
            return Ok(by_conversation);
        }
        Ok(self.latest_matching(|a| a.user_name() == Some(name)).await)
    }

    async fn remove(&self, conversation_id: &str) -> Result<bool, DirectoryError> {
        self.ensure_available()?;
        Ok(self.entries.write().await.remove(conversation_id).is_some())
    }
}
