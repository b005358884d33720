//! StreamCoordinator - drives one streamed reply to its final send.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::domain::foundation::ValidationError;
use crate::domain::streaming::{
    StreamSession, StreamUpdate, DEFAULT_FLUSH_INTERVAL, INFORMATIVE_TEXT,
};
use crate::ports::{Clock, FragmentStream, Transport, TransportError};

use super::StreamError;

/// Configuration for streamed replies.
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    /// Partial-text flushes are at least this far apart.
    pub min_flush_interval: Duration,
    /// Text of the informative placeholder.
    pub informative_text: String,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            min_flush_interval: DEFAULT_FLUSH_INTERVAL,
            informative_text: INFORMATIVE_TEXT.to_string(),
        }
    }
}

/// Turns a fragment stream into a throttled series of streaming sends.
///
/// One informative send, zero or more streaming flushes, one final send.
/// All sends after the first patch the message the first one created.
pub struct StreamCoordinator {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    config: StreamingConfig,
}

impl StreamCoordinator {
    pub fn new(transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(transport, clock, StreamingConfig::default())
    }

    pub fn with_config(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        config: StreamingConfig,
    ) -> Self {
        Self {
            transport,
            clock,
            config,
        }
    }

    /// Runs the session to completion.
    ///
    /// Returns the final update that was delivered.
    ///
    /// # Errors
    ///
    /// - `TransportFailure` if any send fails; nothing else is sent
    /// - `Upstream` if pulling a fragment fails
    /// - `IncompleteStream` if the source ends without a terminal marker
    /// - `Cancelled` if `cancel` fires while waiting for a fragment
    pub async fn run(
        &self,
        mut fragments: FragmentStream,
        cancel: CancellationToken,
    ) -> Result<StreamUpdate, StreamError> {
        if cancel.is_cancelled() {
            return Err(StreamError::Cancelled);
        }

        // 1. Placeholder send; its id becomes the stream id
        let mut session = StreamSession::new();
        let informative = session.informative_update(&self.config.informative_text);
        let stream_id = self
            .transport
            .send(informative.to_activity())
            .await
            .map_err(|e| {
                tracing::warn!(
                    phase = %informative.phase(),
                    sequence = informative.sequence(),
                    error = %e,
                    "Informative send failed"
                );
                StreamError::TransportFailure(e)
            })?;
        if stream_id.as_str().trim().is_empty() {
            tracing::warn!(
                phase = %informative.phase(),
                sequence = informative.sequence(),
                "Informative send returned no activity id"
            );
            return Err(StreamError::TransportFailure(TransportError::invalid_response(
                "no stream id",
            )));
        }
        session.assign_stream_id(stream_id, self.clock.now())?;

        // 2. One iteration per upstream batch
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(sequence = session.sequence(), "Stream cancelled by caller");
                    return Err(StreamError::Cancelled);
                }
                next = fragments.next() => next,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    tracing::warn!(
                        phase = %session.phase(),
                        sequence = session.sequence(),
                        error = %e,
                        "Fragment pull failed"
                    );
                    return Err(StreamError::Upstream(e));
                }
                None => {
                    tracing::warn!(
                        phase = %session.phase(),
                        sequence = session.sequence(),
                        "Fragment source ended without a terminal marker"
                    );
                    return Err(StreamError::IncompleteStream(session.checkpoint()));
                }
            };

            session.advance()?;

            let mut terminal = false;
            for choice in chunk.choices {
                if choice.is_terminal() {
                    terminal = true;
                    break;
                }
                if let Some(content) = choice.delta.content.as_deref() {
                    session.append(content)?;
                }
            }

            if terminal {
                let update = session.finish()?;
                self.deliver(&update).await?;
                tracing::debug!(
                    sequence = update.sequence(),
                    chars = update.text().len(),
                    "Stream finished"
                );
                return Ok(update);
            }

            let now = self.clock.now();
            if session.flush_due(now, self.config.min_flush_interval) {
                let update = session.streaming_update()?;
                self.deliver(&update).await?;
                session.record_flush(now);
            }
        }
    }

    async fn deliver(&self, update: &StreamUpdate) -> Result<(), StreamError> {
        let Some(stream_id) = update.stream_id() else {
            return Err(ValidationError::empty_field("stream_id").into());
        };
        self.transport
            .update(stream_id, update.to_activity())
            .await
            .map_err(|e| {
                tracing::warn!(
                    stream_id = %stream_id,
                    phase = %update.phase(),
                    sequence = update.sequence(),
                    error = %e,
                    "Streaming update failed"
                );
                StreamError::TransportFailure(e)
            })
    }
}
