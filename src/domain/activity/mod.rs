//! Activity module - the chat protocol's unit of traffic.
//!
//! Covers the subset of the Bot Framework activity schema the bot reads
//! from webhooks and writes back through the connector.

mod entity;
mod mention;
mod schema;

pub use entity::{Entity, Mention, StreamInfo};
pub use mention::remove_recipient_mention;
pub use schema::{
    Activity, ActivityId, ActivityType, Attachment, ChannelAccount, ConversationAccount,
};
