//! MessageRouter - answers one inbound user message.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::handlers::streaming::{StreamCoordinator, StreamError, StreamingConfig};
use crate::domain::activity::{remove_recipient_mention, Activity, ActivityId};
use crate::domain::conversation::ConversationAddress;
use crate::domain::streaming::StreamUpdate;
use crate::ports::{Clock, CompletionSource, ConversationDirectory, Transport, TransportFactory};

use super::{GenerateReplyCommand, GenerateReplyHandler, ReplySettings, TurnError};

/// Sent to the user whenever a reply could not be produced.
pub const APOLOGY_TEXT: &str =
    "I apologize, but I encountered an error while processing your request. Please try again later.";

/// Routing options for inbound messages.
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    /// Messages addressed to any other recipient name are ignored.
    /// `None` accepts every recipient.
    pub bot_name: Option<String>,
    pub enable_streaming: bool,
    pub streaming: StreamingConfig,
}

/// Command carrying one inbound `message` activity.
#[derive(Debug, Clone)]
pub struct HandleMessageCommand {
    pub activity: Activity,
}

/// What the router did with a message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    /// The message was addressed to another recipient.
    NotForBot,
    /// Nothing to answer after mention removal (card submissions, bare mentions).
    NoText,
    /// Single-shot reply sent.
    Replied { activity_id: ActivityId },
    /// Streamed reply reached its final send.
    Streamed(StreamUpdate),
    /// The stream ended early; the accumulated text was sent as final.
    ForcedFinal(StreamUpdate),
    /// Generation failed and the apology was sent.
    Apologized,
}

/// Routes inbound messages to a streamed or single-shot reply.
pub struct MessageRouter {
    transports: Arc<dyn TransportFactory>,
    directory: Arc<dyn ConversationDirectory>,
    completions: Arc<dyn CompletionSource>,
    clock: Arc<dyn Clock>,
    settings: ReplySettings,
    config: RouterConfig,
}

impl MessageRouter {
    pub fn new(
        transports: Arc<dyn TransportFactory>,
        directory: Arc<dyn ConversationDirectory>,
        completions: Arc<dyn CompletionSource>,
        clock: Arc<dyn Clock>,
        settings: ReplySettings,
        config: RouterConfig,
    ) -> Self {
        Self {
            transports,
            directory,
            completions,
            clock,
            settings,
            config,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleMessageCommand,
        cancel: CancellationToken,
    ) -> Result<MessageOutcome, TurnError> {
        let activity = cmd.activity;
        let address = ConversationAddress::from_activity(&activity)?;
        let span = tracing::info_span!("message_turn", conversation_id = %address.conversation_id());

        async move {
            let transport = self.transports.for_conversation(&address);

            // 1. Typing indicator before anything slow happens
            transport.send(Activity::typing()).await?;

            // 2. In group chats the recipient name is the bot's display name
            if let Some(expected) = self.config.bot_name.as_deref() {
                if activity.recipient_name() != Some(expected) {
                    tracing::debug!(
                        recipient = activity.recipient_name().unwrap_or_default(),
                        "Message not addressed to this bot"
                    );
                    return Ok(MessageOutcome::NotForBot);
                }
            }

            // 3. Remember where to reach this conversation later
            if let Err(e) = self.directory.upsert(&address).await {
                tracing::warn!(error = %e, "Failed to store conversation address");
            }

            if let Some(value) = activity.value.as_ref() {
                tracing::info!(
                    from = activity.from.as_ref().and_then(|f| f.name.as_deref()).unwrap_or_default(),
                    reply_to_id = activity.reply_to_id.as_ref().map(ActivityId::as_str).unwrap_or_default(),
                    value = %value,
                    "Card submission received"
                );
            }

            // 4. Mention markup is not part of the prompt
            let Some(prompt) = remove_recipient_mention(&activity).filter(|t| !t.is_empty()) else {
                return Ok(MessageOutcome::NoText);
            };

            // 5. Dispatch
            if self.config.enable_streaming {
                self.stream_reply(transport, prompt, cancel).await
            } else {
                self.direct_reply(transport, prompt, cancel).await
            }
        }
        .instrument(span)
        .await
    }

    async fn stream_reply(
        &self,
        transport: Arc<dyn Transport>,
        prompt: String,
        cancel: CancellationToken,
    ) -> Result<MessageOutcome, TurnError> {
        let coordinator = StreamCoordinator::with_config(
            transport.clone(),
            self.clock.clone(),
            self.config.streaming.clone(),
        );
        let fragments = self.completions.stream(self.settings.request_for(prompt));

        match coordinator.run(fragments, cancel).await {
            Ok(update) => Ok(MessageOutcome::Streamed(update)),
            Err(StreamError::Cancelled) => Err(TurnError::Cancelled),
            Err(StreamError::IncompleteStream(checkpoint)) => {
                match checkpoint.final_update().filter(|_| checkpoint.has_text()) {
                    Some(update) => {
                        tracing::warn!(
                            sequence = update.sequence(),
                            "Closing incomplete stream with accumulated text"
                        );
                        if let Some(stream_id) = update.stream_id() {
                            transport.update(stream_id, update.to_activity()).await?;
                        }
                        Ok(MessageOutcome::ForcedFinal(update))
                    }
                    None => self.apologize(transport.as_ref()).await,
                }
            }
            Err(e) => {
                tracing::error!(error_kind = e.kind(), error = %e, "Streamed reply failed");
                self.apologize(transport.as_ref()).await
            }
        }
    }

    async fn direct_reply(
        &self,
        transport: Arc<dyn Transport>,
        prompt: String,
        cancel: CancellationToken,
    ) -> Result<MessageOutcome, TurnError> {
        let generator = self.reply_generator();
        let generated = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TurnError::Cancelled),
            generated = generator.handle(GenerateReplyCommand { prompt }) => generated,
        };

        match generated {
            Ok(text) => {
                let activity_id = transport.send(Activity::message(text)).await?;
                Ok(MessageOutcome::Replied { activity_id })
            }
            Err(e) => {
                tracing::error!(error = %e, "Reply generation failed");
                self.apologize(transport.as_ref()).await
            }
        }
    }

    fn reply_generator(&self) -> GenerateReplyHandler {
        GenerateReplyHandler::new(self.completions.clone(), self.settings.clone())
    }

    async fn apologize(&self, transport: &dyn Transport) -> Result<MessageOutcome, TurnError> {
        transport.send(Activity::message(APOLOGY_TEXT)).await?;
        Ok(MessageOutcome::Apologized)
    }
}
