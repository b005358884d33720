//! Conversation module - addressing conversations outside a turn.

mod address;
mod lookup;

pub use address::ConversationAddress;
pub use lookup::LookupKey;
