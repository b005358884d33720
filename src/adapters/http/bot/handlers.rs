//! HTTP handlers for the bot endpoints.
//!
//! `POST /api/messages` is the channel webhook. Message turns run in a
//! spawned task; the request holds a drop guard on the turn's cancellation
//! token, so a caller that hangs up stops the turn.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio_util::sync::CancellationToken;

use crate::application::handlers::conversation::{
    HandleMessageCommand, InstallationHandler, MessageRouter, ProactiveMessageHandler,
    ReplySettings, RouterConfig, SendProactiveCommand, TurnError,
};
use crate::domain::activity::{Activity, ActivityType};
use crate::ports::{Clock, CompletionSource, ConversationDirectory, TransportFactory};

use super::dto::{ErrorResponse, NotifyRequest, NotifyResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
#[derive(Clone)]
pub struct BotAppState {
    pub transports: Arc<dyn TransportFactory>,
    pub directory: Arc<dyn ConversationDirectory>,
    pub completions: Arc<dyn CompletionSource>,
    pub clock: Arc<dyn Clock>,
    pub reply_settings: ReplySettings,
    pub router_config: RouterConfig,
    /// Log inbound webhook bodies at debug level.
    pub log_requests: bool,
}

impl BotAppState {
    pub fn message_router(&self) -> MessageRouter {
        MessageRouter::new(
            self.transports.clone(),
            self.directory.clone(),
            self.completions.clone(),
            self.clock.clone(),
            self.reply_settings.clone(),
            self.router_config.clone(),
        )
    }

    pub fn installation_handler(&self) -> InstallationHandler {
        InstallationHandler::new(self.transports.clone(), self.directory.clone())
    }

    pub fn proactive_handler(&self) -> ProactiveMessageHandler {
        ProactiveMessageHandler::new(self.transports.clone(), self.directory.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub enum BotApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<TurnError> for BotApiError {
    fn from(err: TurnError) -> Self {
        match err {
            TurnError::InvalidActivity(e) => BotApiError::BadRequest(e.to_string()),
            other => BotApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for BotApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            BotApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg)),
            BotApiError::NotFound(id) => {
                (StatusCode::NOT_FOUND, ErrorResponse::not_found("Conversation", &id))
            }
            BotApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::internal(msg))
            }
        };

        (status, Json(error)).into_response()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/messages - Channel webhook
pub async fn receive_activity(
    State(state): State<BotAppState>,
    body: Bytes,
) -> Result<StatusCode, BotApiError> {
    if state.log_requests {
        tracing::debug!(body = %String::from_utf8_lossy(&body), "Received activity");
    }

    let activity: Activity = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Rejected malformed activity");
        BotApiError::BadRequest(format!("Invalid activity: {}", e))
    })?;

    match &activity.activity_type {
        ActivityType::Message => run_message_turn(&state, activity).await,
        ActivityType::InstallationUpdate => {
            let outcome = state.installation_handler().handle(&activity).await?;
            tracing::info!(
                conversation_id = %activity.conversation_id(),
                outcome = ?outcome,
                "Installation update handled"
            );
            Ok(StatusCode::OK)
        }
        ActivityType::ConversationUpdate => {
            tracing::debug!(
                conversation_id = %activity.conversation_id(),
                members_added = activity.members_added.len(),
                "Conversation update acknowledged"
            );
            Ok(StatusCode::OK)
        }
        other => {
            tracing::debug!(activity_type = %other, "Activity type not handled");
            Ok(StatusCode::OK)
        }
    }
}

async fn run_message_turn(state: &BotAppState, activity: Activity) -> Result<StatusCode, BotApiError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let router = state.message_router();
    let turn = tokio::spawn(async move {
        router
            .handle(HandleMessageCommand { activity }, cancel)
            .await
    });

    match turn.await {
        Ok(Ok(outcome)) => {
            tracing::debug!(outcome = ?outcome, "Message turn finished");
            Ok(StatusCode::OK)
        }
        Ok(Err(TurnError::Cancelled)) => {
            tracing::info!("Message turn cancelled");
            Ok(StatusCode::OK)
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Message turn failed");
            Err(e.into())
        }
        Err(e) => {
            tracing::error!(error = %e, "Message turn task panicked");
            Err(BotApiError::Internal("message turn aborted".to_string()))
        }
    }
}

/// GET /api/health - Liveness probe
pub async fn health() -> &'static str {
    tracing::debug!("Health check OK");
    "OK"
}

/// POST /api/notify - Proactive message to a stored conversation
pub async fn notify(
    State(state): State<BotAppState>,
    Json(request): Json<NotifyRequest>,
) -> Result<Json<NotifyResponse>, BotApiError> {
    let command = SendProactiveCommand::try_from(request).map_err(BotApiError::BadRequest)?;
    let recipient = command.recipient.clone();

    match state.proactive_handler().handle(command).await? {
        Some(activity_id) => Ok(Json(NotifyResponse {
            activity_id: activity_id.as_str().to_string(),
        })),
        None => Err(BotApiError::NotFound(recipient)),
    }
}
