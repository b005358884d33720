//! HTTP adapters - axum endpoints.

pub mod bot;

use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use bot::{bot_router, BotAppState};

/// Builds the full application with tracing and a request deadline.
pub fn build_app(state: BotAppState, enable_notify: bool, request_timeout: Duration) -> Router {
    bot_router(state, enable_notify)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}
