//! Activity entities.
//!
//! Only the two entity kinds the bot acts on are typed: `streaminfo`
//! (outbound streaming metadata) and `mention` (inbound @-mentions).
//! Every other entity is carried as raw JSON.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::schema::{ActivityId, ChannelAccount};
use crate::domain::streaming::StreamPhase;

/// Streaming metadata attached to every streamed activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    /// Absent only on the first (informative) send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<ActivityId>,
    pub stream_type: StreamPhase,
    pub stream_sequence: u32,
}

/// An @-mention of an account inside the activity text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub mentioned: ChannelAccount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// An entity attached to an activity.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    StreamInfo(StreamInfo),
    Mention(Mention),
    Other(serde_json::Value),
}

impl Entity {
    /// Returns the stream info if this is a `streaminfo` entity.
    pub fn as_stream_info(&self) -> Option<&StreamInfo> {
        match self {
            Entity::StreamInfo(info) => Some(info),
            _ => None,
        }
    }

    /// Returns the mention if this is a `mention` entity.
    pub fn as_mention(&self) -> Option<&Mention> {
        match self {
            Entity::Mention(mention) => Some(mention),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum TaggedEntity {
    #[serde(rename = "streaminfo")]
    StreamInfo(StreamInfo),
    #[serde(rename = "mention")]
    Mention(Mention),
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Entity::StreamInfo(info) => TaggedEntity::StreamInfo(info.clone()).serialize(serializer),
            Entity::Mention(mention) => TaggedEntity::Mention(mention.clone()).serialize(serializer),
            Entity::Other(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value.get("type").and_then(serde_json::Value::as_str) {
            Some("streaminfo") | Some("mention") => {
                let tagged: TaggedEntity =
                    serde_json::from_value(value).map_err(D::Error::custom)?;
                Ok(match tagged {
                    TaggedEntity::StreamInfo(info) => Entity::StreamInfo(info),
                    TaggedEntity::Mention(mention) => Entity::Mention(mention),
                })
            }
            _ => Ok(Entity::Other(value)),
        }
    }
}
