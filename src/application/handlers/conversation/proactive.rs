//! ProactiveMessageHandler - messages sent outside of a turn.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::activity::{Activity, ActivityId, ActivityType, Attachment};
use crate::domain::conversation::{ConversationAddress, LookupKey};
use crate::ports::{ConversationDirectory, DirectoryError, TransportFactory};

use super::TurnError;

/// Body of a proactive message.
#[derive(Debug, Clone, PartialEq)]
pub enum ProactiveContent {
    Text(String),
    /// Adaptive card JSON, sent as-is.
    Card(Value),
}

impl ProactiveContent {
    fn into_activity(self) -> Activity {
        match self {
            ProactiveContent::Text(text) => Activity::message(text),
            ProactiveContent::Card(card) => {
                Activity::new(ActivityType::Message).with_attachment(Attachment::adaptive_card(card))
            }
        }
    }
}

/// Command to message a conversation by id, AAD object id or name.
#[derive(Debug, Clone)]
pub struct SendProactiveCommand {
    pub recipient: String,
    pub content: ProactiveContent,
}

/// Resolves a free-form identifier to a stored address.
///
/// The identifier is classified first. If the classified lookup finds
/// nothing it is retried as a plain conversation id.
pub async fn resolve_address(
    directory: &dyn ConversationDirectory,
    identifier: &str,
) -> Result<Option<ConversationAddress>, DirectoryError> {
    let key = LookupKey::classify(identifier);
    let found = match &key {
        LookupKey::ConversationId(id) => directory.find_by_conversation_id(id).await?,
        LookupKey::AadObjectId(id) => directory.find_by_aad_object_id(id).await?,
        LookupKey::Name(name) => directory.find_by_name(name).await?,
    };

    match (found, key) {
        (Some(address), _) => Ok(Some(address)),
        (None, LookupKey::ConversationId(_)) => Ok(None),
        (None, _) => directory.find_by_conversation_id(identifier).await,
    }
}

/// Sends proactive messages to stored conversations.
pub struct ProactiveMessageHandler {
    transports: Arc<dyn TransportFactory>,
    directory: Arc<dyn ConversationDirectory>,
}

impl ProactiveMessageHandler {
    pub fn new(
        transports: Arc<dyn TransportFactory>,
        directory: Arc<dyn ConversationDirectory>,
    ) -> Self {
        Self {
            transports,
            directory,
        }
    }

    /// Returns the sent activity id, or `None` when no address matches.
    pub async fn handle(&self, cmd: SendProactiveCommand) -> Result<Option<ActivityId>, TurnError> {
        let Some(address) = resolve_address(self.directory.as_ref(), &cmd.recipient).await? else {
            tracing::warn!(recipient = %cmd.recipient, "Conversation address not found");
            return Ok(None);
        };

        let transport = self.transports.proactive(&address);
        let activity_id = transport.send(cmd.content.into_activity()).await?;
        tracing::info!(
            conversation_id = %address.conversation_id(),
            activity_id = %activity_id,
            "Proactive message sent"
        );
        Ok(Some(activity_id))
    }
}
