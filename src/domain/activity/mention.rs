//! Mention stripping for inbound message text.

use super::schema::Activity;

/// Returns the activity text with every mention of the recipient removed.
///
/// In group chats and channels the bot only sees messages that @-mention it,
/// so the raw text starts with `<at>BotName</at>`. That markup must not be
/// forwarded to the model. Mentions of other accounts are left in place.
/// Returns `None` when the activity has no text at all.
pub fn remove_recipient_mention(activity: &Activity) -> Option<String> {
    let mut text = activity.text.clone()?;

    if let Some(recipient) = activity.recipient.as_ref() {
        for mention in activity.entities.iter().filter_map(|e| e.as_mention()) {
            if mention.mentioned.id != recipient.id {
                continue;
            }
            if let Some(markup) = mention.text.as_deref().filter(|m| !m.is_empty()) {
                text = text.replacen(markup, "", 1);
            }
        }
    }

    Some(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::activity::{ChannelAccount, Entity, Mention};

    fn mention(id: &str, markup: &str) -> Entity {
        Entity::Mention(Mention {
            mentioned: ChannelAccount::new(id),
            text: Some(markup.to_string()),
        })
    }

    fn addressed_to_bot(text: &str) -> Activity {
        let mut activity = Activity::message(text);
        activity.recipient = Some(ChannelAccount::new("28:bot").with_name("RelayBot"));
        activity
    }

    #[test]
    fn strips_bot_mention_and_trims() {
        let activity = addressed_to_bot("<at>RelayBot</at>  summarize the thread ")
            .with_entity(mention("28:bot", "<at>RelayBot</at>"));

        assert_eq!(
            remove_recipient_mention(&activity).as_deref(),
            Some("summarize the thread")
        );
    }

    #[test]
    fn keeps_mentions_of_other_users() {
        let activity = addressed_to_bot("<at>RelayBot</at> ask <at>Grace</at> about it")
            .with_entity(mention("28:bot", "<at>RelayBot</at>"))
            .with_entity(mention("29:grace", "<at>Grace</at>"));

        assert_eq!(
            remove_recipient_mention(&activity).as_deref(),
            Some("ask <at>Grace</at> about it")
        );
    }

    #[test]
    fn text_without_mentions_is_only_trimmed() {
        let activity = addressed_to_bot("  hello \n");
        assert_eq!(remove_recipient_mention(&activity).as_deref(), Some("hello"));
    }

    #[test]
    fn missing_text_yields_none() {
        let mut activity = addressed_to_bot("");
        activity.text = None;
        assert_eq!(remove_recipient_mention(&activity), None);
    }

    #[test]
    fn mention_only_message_becomes_empty() {
        let activity = addressed_to_bot("<at>RelayBot</at>")
            .with_entity(mention("28:bot", "<at>RelayBot</at>"));
        assert_eq!(remove_recipient_mention(&activity).as_deref(), Some(""));
    }
}
