//! Bot HTTP adapter - channel webhook, health probe and proactive notify.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ErrorResponse, NotifyKind, NotifyRequest, NotifyResponse};
pub use handlers::{BotApiError, BotAppState};
pub use routes::{bot_router, bot_routes};
