//! Application layer - Handlers orchestrating domain types and ports.

pub mod handlers;

pub use handlers::{
    GenerateReplyHandler, InstallationHandler, MessageRouter, ProactiveMessageHandler,
    StreamCoordinator,
};
