//! Application handlers.
//!
//! Handlers that drive ports on behalf of one inbound turn or one
//! proactive send.

pub mod conversation;
pub mod streaming;

pub use conversation::{
    resolve_address, GenerateReplyCommand, GenerateReplyHandler, HandleMessageCommand,
    InstallationHandler, InstallationOutcome, MessageOutcome, MessageRouter, ProactiveContent,
    ProactiveMessageHandler, ReplySettings, RouterConfig, SendProactiveCommand, TurnError,
    APOLOGY_TEXT, DEFAULT_SYSTEM_PROMPT, WELCOME_TEXT,
};
pub use streaming::{StreamCoordinator, StreamError, StreamingConfig};
