//! Conversation turn handlers.
//!
//! - `MessageRouter` - inbound user messages
//! - `GenerateReplyHandler` - single-shot completions
//! - `InstallationHandler` - install and uninstall events
//! - `ProactiveMessageHandler` - messages outside a turn

mod errors;
mod generate_reply;
mod handle_message;
mod installation;
mod proactive;

pub use errors::TurnError;
pub use generate_reply::{
    GenerateReplyCommand, GenerateReplyHandler, ReplySettings, DEFAULT_SYSTEM_PROMPT,
};
pub use handle_message::{
    HandleMessageCommand, MessageOutcome, MessageRouter, RouterConfig, APOLOGY_TEXT,
};
pub use installation::{InstallationHandler, InstallationOutcome, WELCOME_TEXT};
pub use proactive::{resolve_address, ProactiveContent, ProactiveMessageHandler, SendProactiveCommand};
