//! Axum router configuration for the bot endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{health, notify, receive_activity, BotAppState};

/// Create the bot API router.
///
/// # Routes
///
/// - `POST /api/messages` - Channel webhook
/// - `GET /api/health` - Liveness probe
/// - `POST /api/notify` - Proactive message (only when `enable_notify` is set)
pub fn bot_routes(enable_notify: bool) -> Router<BotAppState> {
    let router = Router::new()
        .route("/api/messages", post(receive_activity))
        .route("/api/health", get(health));

    if enable_notify {
        router.route("/api/notify", post(notify))
    } else {
        router
    }
}

/// Create the complete bot router with its state applied.
pub fn bot_router(state: BotAppState, enable_notify: bool) -> Router {
    bot_routes(enable_notify).with_state(state)
}
