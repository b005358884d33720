//! ConversationAddress - where to send messages for a conversation.

use serde::{Deserialize, Serialize};

use crate::domain::activity::{Activity, ActivityId, ChannelAccount, ConversationAccount};
use crate::domain::foundation::ValidationError;

/// Everything needed to route an outbound activity back into a
/// conversation, outside of the turn that produced it.
///
/// Serialized with the connector's conversation reference field names so
/// stored rows stay readable by other Bot Framework tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    activity_id: Option<ActivityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bot: Option<ChannelAccount>,
    conversation: ConversationAccount,
    #[serde(default)]
    channel_id: String,
    service_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    locale: Option<String>,
}

impl ConversationAddress {
    /// Captures the address of an inbound activity.
    ///
    /// # Errors
    ///
    /// Returns `EmptyField` if the activity has no conversation id or no
    /// service URL.
    pub fn from_activity(activity: &Activity) -> Result<Self, ValidationError> {
        let conversation = activity
            .conversation
            .clone()
            .filter(|c| !c.id.trim().is_empty())
            .ok_or_else(|| ValidationError::empty_field("conversation.id"))?;
        let service_url = activity
            .service_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ValidationError::empty_field("serviceUrl"))?;

        Ok(Self {
            activity_id: activity.id.clone(),
            user: activity.from.clone(),
            bot: activity.recipient.clone(),
            conversation,
            channel_id: activity.channel_id.clone().unwrap_or_default(),
            service_url,
            locale: activity.locale.clone(),
        })
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation.id
    }

    pub fn conversation(&self) -> &ConversationAccount {
        &self.conversation
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn activity_id(&self) -> Option<&ActivityId> {
        self.activity_id.as_ref()
    }

    pub fn user(&self) -> Option<&ChannelAccount> {
        self.user.as_ref()
    }

    pub fn bot(&self) -> Option<&ChannelAccount> {
        self.bot.as_ref()
    }

    pub fn is_personal(&self) -> bool {
        self.conversation.is_personal()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.name.as_deref())
    }

    pub fn user_aad_object_id(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.aad_object_id.as_deref())
    }

    /// Fills routing fields of an outbound activity.
    ///
    /// With `reply` set, the activity is threaded under the captured inbound
    /// activity.
    pub fn apply_to(&self, mut activity: Activity, reply: bool) -> Activity {
        activity.from = self.bot.clone();
        activity.recipient = self.user.clone();
        activity.conversation = Some(self.conversation.clone());
        activity.service_url = Some(self.service_url.clone());
        if !self.channel_id.is_empty() {
            activity.channel_id = Some(self.channel_id.clone());
        }
        if activity.locale.is_none() {
            activity.locale = self.locale.clone();
        }
        if reply {
            activity.reply_to_id = self.activity_id.clone();
        }
        activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound() -> Activity {
        let mut activity = Activity::message("hi").with_id(ActivityId::new("in-1"));
        activity.service_url = Some("https://smba.example.net/amer/".to_string());
        activity.channel_id = Some("msteams".to_string());
        activity.from = Some(
            ChannelAccount::new("29:user")
                .with_name("Ada Lovelace")
                .with_aad_object_id("6f1c2b3a-1111-2222-3333-444455556666"),
        );
        activity.recipient = Some(ChannelAccount::new("28:bot").with_name("RelayBot"));
        let mut conversation = ConversationAccount::new("a:1x2y3z");
        conversation.conversation_type = Some("personal".to_string());
        activity.conversation = Some(conversation);
        activity
    }

    #[test]
    fn captures_routing_fields() {
        let address = ConversationAddress::from_activity(&inbound()).unwrap();

        assert_eq!(address.conversation_id(), "a:1x2y3z");
        assert_eq!(address.service_url(), "https://smba.example.net/amer/");
        assert_eq!(address.user_name(), Some("Ada Lovelace"));
        assert_eq!(
            address.user_aad_object_id(),
            Some("6f1c2b3a-1111-2222-3333-444455556666")
        );
        assert!(address.is_personal());
    }

    #[test]
    fn rejects_activity_without_conversation() {
        let mut activity = inbound();
        activity.conversation = None;
        assert_eq!(
            ConversationAddress::from_activity(&activity),
            Err(ValidationError::empty_field("conversation.id"))
        );
    }

    #[test]
    fn rejects_activity_without_service_url() {
        let mut activity = inbound();
        activity.service_url = Some("  ".to_string());
        assert_eq!(
            ConversationAddress::from_activity(&activity),
            Err(ValidationError::empty_field("serviceUrl"))
        );
    }

    #[test]
    fn apply_to_swaps_user_and_bot() {
        let address = ConversationAddress::from_activity(&inbound()).unwrap();
        let outbound = address.apply_to(Activity::message("reply"), true);

        assert_eq!(outbound.from.as_ref().unwrap().id, "28:bot");
        assert_eq!(outbound.recipient.as_ref().unwrap().id, "29:user");
        assert_eq!(outbound.reply_to_id, Some(ActivityId::new("in-1")));
        assert_eq!(outbound.conversation_id(), "a:1x2y3z");
    }

    #[test]
    fn proactive_apply_does_not_thread() {
        let address = ConversationAddress::from_activity(&inbound()).unwrap();
        let outbound = address.apply_to(Activity::message("ping"), false);
        assert!(outbound.reply_to_id.is_none());
    }

    #[test]
    fn serializes_as_conversation_reference() {
        let address = ConversationAddress::from_activity(&inbound()).unwrap();
        let json = serde_json::to_value(&address).unwrap();

        assert_eq!(json["serviceUrl"], "https://smba.example.net/amer/");
        assert_eq!(json["conversation"]["id"], "a:1x2y3z");
        assert_eq!(json["activityId"], "in-1");

        let back: ConversationAddress = serde_json::from_value(json).unwrap();
        assert_eq!(back, address);
    }
}
