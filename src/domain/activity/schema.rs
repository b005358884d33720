//! Chat activity value objects (Bot Framework schema subset).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::Entity;

/// Identifier the chat service assigns to an activity.
///
/// The first streaming send returns one of these; it is reused as the
/// `streamId` of every later update in the same stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    /// Creates an ActivityId from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActivityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Activity type discriminator.
///
/// Unknown types are kept verbatim so they can be acknowledged and logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    #[default]
    Message,
    Typing,
    InstallationUpdate,
    ConversationUpdate,
    Other(String),
}

impl ActivityType {
    /// Wire name of this activity type.
    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::Message => "message",
            ActivityType::Typing => "typing",
            ActivityType::InstallationUpdate => "installationUpdate",
            ActivityType::ConversationUpdate => "conversationUpdate",
            ActivityType::Other(name) => name,
        }
    }
}

impl From<String> for ActivityType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "message" => ActivityType::Message,
            "typing" => ActivityType::Typing,
            "installationUpdate" => ActivityType::InstallationUpdate,
            "conversationUpdate" => ActivityType::ConversationUpdate,
            _ => ActivityType::Other(value),
        }
    }
}

impl From<ActivityType> for String {
    fn from(value: ActivityType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user or bot taking part in a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad_object_id: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_aad_object_id(mut self, aad_object_id: impl Into<String>) -> Self {
        self.aad_object_id = Some(aad_object_id.into());
        self
    }
}

/// The conversation an activity belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `personal`, `groupChat` or `channel` on Teams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
}

impl ConversationAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Returns true for one-to-one conversations between a user and the bot.
    pub fn is_personal(&self) -> bool {
        self.conversation_type.as_deref() == Some("personal")
    }
}

/// Rich content attached to an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    pub content: serde_json::Value,
}

impl Attachment {
    /// Content type of an adaptive card attachment.
    pub const ADAPTIVE_CARD: &'static str = "application/vnd.microsoft.card.adaptive";

    /// Wraps an adaptive card payload without inspecting it.
    pub fn adaptive_card(content: serde_json::Value) -> Self {
        Self {
            content_type: Self::ADAPTIVE_CARD.to_string(),
            content,
        }
    }
}

/// One unit of chat-protocol traffic, inbound or outbound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ActivityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<ActivityId>,
    /// Payload of an adaptive card submit action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,
    /// `add` or `remove` on installation updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Activity {
    /// Creates an empty activity of the given type.
    pub fn new(activity_type: ActivityType) -> Self {
        Self {
            activity_type,
            ..Default::default()
        }
    }

    /// Creates a plain text message.
    pub fn message(text: impl Into<String>) -> Self {
        Self::new(ActivityType::Message).with_text(text)
    }

    /// Creates a typing indicator.
    pub fn typing() -> Self {
        Self::new(ActivityType::Typing)
    }

    pub fn with_id(mut self, id: ActivityId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Conversation id, or an empty string when the activity carries none.
    pub fn conversation_id(&self) -> &str {
        self.conversation
            .as_ref()
            .map(|c| c.id.as_str())
            .unwrap_or_default()
    }

    /// True for an installation update that uninstalls the bot.
    pub fn is_uninstall(&self) -> bool {
        self.action
            .as_deref()
            .is_some_and(|action| action.starts_with("remove"))
    }

    /// Display name of the account the activity was addressed to.
    pub fn recipient_name(&self) -> Option<&str> {
        self.recipient.as_ref().and_then(|r| r.name.as_deref())
    }
}
